//! Run driver
//!
//! One run resets the scene, lays down the base surface, then composes one
//! marker per dataset entry. Shader requests are validated before the scene
//! is touched, so a bad shader kind aborts the run with nothing built.

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::dataset::Dataset;
use crate::marker::{compose_marker, MarkerHandles};
use crate::material::{material_key, Rgb, ShaderError, ShaderSpec};
use crate::scene::{ObjectId, Scene, SceneError};
use crate::surface::{load_surface, SurfaceError};

/// Key prefix of marker materials
pub const MARKER_SHADER_PREFIX: &str = "LEDShader";
/// Key prefix of label materials
pub const LABEL_SHADER_PREFIX: &str = "TextShader";

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Invalid shader: {0}")]
    Shader(#[from] ShaderError),
    #[error("Failed to load surface: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Failed to compose marker: {0}")]
    Scene(#[from] SceneError),
}

/// Unvalidated shader settings
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderRequest {
    pub kind: String,
    pub color: Rgb,
    pub intensity: Option<f32>,
}

impl ShaderRequest {
    pub fn emissive(color: Rgb, intensity: f32) -> Self {
        Self {
            kind: "emissive".to_string(),
            color,
            intensity: Some(intensity),
        }
    }

    pub fn diffuse(color: Rgb) -> Self {
        Self {
            kind: "diffuse".to_string(),
            color,
            intensity: None,
        }
    }

    pub fn spec(&self) -> Result<ShaderSpec, ShaderError> {
        ShaderSpec::parse(&self.kind, self.color, self.intensity)
    }
}

/// Parameters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Width of the base surface in scene units
    pub max_size_dim: f64,
    /// Map image to import as the base surface
    pub image_path: PathBuf,
    pub marker_shader: ShaderRequest,
    pub label_shader: ShaderRequest,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_size_dim: 90.0,
            image_path: PathBuf::from("res/png/us_map.png"),
            marker_shader: ShaderRequest::emissive(Rgb::WHITE, 1.0),
            label_shader: ShaderRequest::diffuse(Rgb::BLACK),
        }
    }
}

/// What a run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub surface: Option<ObjectId>,
    pub markers: Vec<MarkerHandles>,
}

impl RunReport {
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.markers.iter().map(|m| m.group.as_str())
    }
}

/// Rebuild `scene` from scratch for `dataset`
pub fn compose_scene(
    scene: &mut Scene,
    config: &RunConfig,
    dataset: &Dataset,
) -> Result<RunReport, ComposeError> {
    let marker_spec = config.marker_shader.spec()?;
    let label_spec = config.label_shader.spec()?;
    let marker_key = material_key(MARKER_SHADER_PREFIX, marker_spec.color());
    let label_key = material_key(LABEL_SHADER_PREFIX, label_spec.color());

    scene.reset();

    let surface = load_surface(scene, config.max_size_dim, &config.image_path)?;

    let mut report = RunReport {
        surface,
        markers: Vec::with_capacity(dataset.len()),
    };

    for entry in dataset.entries() {
        scene.rebuild_material(&marker_key, &marker_spec);
        scene.rebuild_material(&label_key, &label_spec);

        let handles = compose_marker(
            scene,
            entry.position(),
            &marker_key,
            &entry.label,
            &label_key,
        )?;
        report.markers.push(handles);
    }

    info!(
        markers = report.markers.len(),
        surface = report.surface.is_some(),
        "Scene composed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MarkerEntry;
    use crate::material::{NodeType, SocketValue};
    use glam::DVec3;
    use tempfile::TempDir;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < 1e-9
    }

    fn config_with_image(dir: &TempDir, width: u32, height: u32) -> RunConfig {
        let path = dir.path().join("us_map.png");
        image::GrayImage::new(width, height).save(&path).unwrap();
        RunConfig {
            image_path: path,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_marker_scenario() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_image(&temp_dir, 2000, 1000);
        let dataset = Dataset::new(vec![MarkerEntry::new("AL", [14.0, -1.0, 0.0])]).unwrap();

        let mut scene = Scene::new();
        let report = compose_scene(&mut scene, &config, &dataset).unwrap();

        let surface = scene.object(report.surface.unwrap()).unwrap();
        assert_eq!(surface.dimensions(), DVec3::new(90.0, 45.0, 0.0));
        assert_eq!(surface.location, DVec3::ZERO);
        assert!(scene.root_collection().objects.contains(&report.surface.unwrap()));

        assert_eq!(report.group_names().collect::<Vec<_>>(), vec!["AL_led"]);
        let group = scene.collection("AL_led").unwrap();
        assert_eq!(group.objects.len(), 2);

        let marker = scene.object(report.markers[0].marker).unwrap();
        assert_eq!(marker.location, DVec3::new(14.0, -1.0, 0.0));
        let material = scene.material(&marker.materials[0]).unwrap();
        assert_eq!(material.name, "LEDShader_255_255_255");
        let shader = material.shader().unwrap();
        assert_eq!(shader.node_type, NodeType::Emission);
        assert_eq!(
            shader.input("Color").unwrap().value,
            SocketValue::Color([255.0, 255.0, 255.0, 1.0])
        );

        let label = scene.object(report.markers[0].label).unwrap();
        assert!(approx(label.location, DVec3::new(13.75, -1.25, 0.3)));
        assert_eq!(label.materials, vec!["TextShader_0_0_0".to_string()]);
    }

    #[test]
    fn test_full_dataset_is_reproducible() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_image(&temp_dir, 400, 250);
        let dataset = Dataset::us_state_capitals();

        let mut scene = Scene::new();
        let report = compose_scene(&mut scene, &config, &dataset).unwrap();
        assert_eq!(report.markers.len(), 50);
        assert_eq!(scene.object_count(), 101);
        assert_eq!(scene.collection_names().count(), 50);
        assert_eq!(scene.materials().len(), 2);
        let first = scene.snapshot();

        compose_scene(&mut scene, &config, &dataset).unwrap();
        assert_eq!(scene.snapshot(), first);
    }

    #[test]
    fn test_missing_image_still_places_markers() {
        let config = RunConfig {
            image_path: PathBuf::from("/nonexistent/us_map.png"),
            ..Default::default()
        };
        let dataset = Dataset::new(vec![MarkerEntry::new("AL", [14.0, -1.0, 0.0])]).unwrap();

        let mut scene = Scene::new();
        let report = compose_scene(&mut scene, &config, &dataset).unwrap();

        assert!(report.surface.is_none());
        assert_eq!(scene.object_count(), 2);
    }

    #[test]
    fn test_invalid_shader_kind_aborts() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_with_image(&temp_dir, 20, 10);
        config.marker_shader.kind = "specular".to_string();

        let mut scene = Scene::new();
        let err = compose_scene(&mut scene, &config, &Dataset::us_state_capitals()).unwrap_err();

        assert!(matches!(
            err,
            ComposeError::Shader(ShaderError::InvalidShaderKind(ref k)) if k == "specular"
        ));
        assert!(scene.materials().is_empty());
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_previous_run_is_cleared() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_with_image(&temp_dir, 20, 10);

        let mut scene = Scene::new();
        compose_scene(&mut scene, &config, &Dataset::us_state_capitals()).unwrap();

        let small = Dataset::new(vec![MarkerEntry::new("TX", [-3.0, -7.5, 0.0])]).unwrap();
        compose_scene(&mut scene, &config, &small).unwrap();

        assert_eq!(scene.object_count(), 3);
        assert_eq!(scene.collection_names().collect::<Vec<_>>(), vec!["TX_led"]);
    }

    #[test]
    fn test_material_colors_follow_config() {
        let config = RunConfig {
            image_path: PathBuf::from("/nonexistent.png"),
            marker_shader: ShaderRequest::emissive(Rgb::new(255, 0, 0), 4.0),
            ..Default::default()
        };
        let dataset = Dataset::new(vec![MarkerEntry::new("AL", [0.0; 3])]).unwrap();

        let mut scene = Scene::new();
        compose_scene(&mut scene, &config, &dataset).unwrap();

        let material = scene.material("LEDShader_255_0_0").unwrap();
        let shader = material.shader().unwrap();
        assert_eq!(shader.input("Strength").unwrap().value, SocketValue::Float(4.0));
    }
}
