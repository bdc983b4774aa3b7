//! Configuration loading and validation

use anyhow::Result;
use mapmark_core::{Dataset, Rgb, RunConfig, ShaderRequest};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default = "default_marker_shader")]
    pub marker: ShaderConfig,
    #[serde(default = "default_label_shader")]
    pub label: ShaderConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Width of the base surface in scene units
    #[serde(default = "default_max_size_dim")]
    pub max_size_dim: f64,
    /// Path to the map image
    #[serde(default = "default_image")]
    pub image: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            max_size_dim: default_max_size_dim(),
            image: default_image(),
        }
    }
}

fn default_max_size_dim() -> f64 {
    90.0
}

fn default_image() -> String {
    "res/png/us_map.png".to_string()
}

/// Shader settings for markers or labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Shading kind ("emissive" or "diffuse")
    pub shader: String,
    /// RGB color, 0-255 per channel
    pub color: [u8; 3],
    /// Emission strength (emissive only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
}

fn default_marker_shader() -> ShaderConfig {
    ShaderConfig {
        shader: "emissive".to_string(),
        color: [255, 255, 255],
        intensity: Some(1.0),
    }
}

fn default_label_shader() -> ShaderConfig {
    ShaderConfig {
        shader: "diffuse".to_string(),
        color: [0, 0, 0],
        intensity: None,
    }
}

impl ShaderConfig {
    fn to_request(&self) -> ShaderRequest {
        ShaderRequest {
            kind: self.shader.clone(),
            color: Rgb(self.color),
            intensity: self.intensity,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// TOML file of `[[marker]]` entries; the built-in US capitals when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Config {
    /// Convert to the core run parameters
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            max_size_dim: self.surface.max_size_dim,
            image_path: PathBuf::from(&self.surface.image),
            marker_shader: self.marker.to_request(),
            label_shader: self.label.to_request(),
        }
    }

    /// Load the configured dataset
    pub fn load_dataset(&self) -> Result<Dataset> {
        match &self.dataset.path {
            Some(path) => {
                let dataset = Dataset::from_file(Path::new(path))?;
                info!(path = %path, markers = dataset.len(), "Loaded dataset");
                Ok(dataset)
            }
            None => Ok(Dataset::us_state_capitals()),
        }
    }
}

fn defaults() -> Config {
    Config {
        surface: SurfaceConfig::default(),
        marker: default_marker_shader(),
        label: default_label_shader(),
        dataset: DatasetConfig::default(),
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(defaults())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&defaults())?;
    std::fs::write(path, content)?;
    Ok(())
}
