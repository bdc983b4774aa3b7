//! Marker composition
//!
//! A marker is a short cylinder standing at a dataset position, topped with a
//! solid text label, both grouped in a collection named `{label}_led`.

use glam::DVec3;
use tracing::debug;

use crate::label::{build_label, label_object_name};
use crate::scene::{NameKind, ObjectId, Scene, SceneError};

pub const MARKER_RADIUS: f64 = 0.5;
pub const MARKER_DEPTH: f64 = 0.5;

/// Bounding box every label is scaled to, regardless of text length
pub const LABEL_DIMENSIONS: DVec3 = DVec3::new(0.5, 0.5, 0.3);
/// Label origin sits this far below and left of the marker center
pub const LABEL_OFFSET: f64 = 0.25;
/// Label base height, on top of the marker
pub const LABEL_ELEVATION: f64 = 0.3;
/// Display tint of label objects
pub const LABEL_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Marker object name, unique per position.
///
/// Coordinates use `{:?}` float formatting: `14.0`, `-1.0`, and `1e16` for large magnitudes.
pub fn marker_name(position: DVec3) -> String {
    format!("LED_{:?}_{:?}_{:?}", position.x, position.y, position.z)
}

/// Naming root of the label built for a marker at `position`
pub fn label_root(position: DVec3) -> String {
    format!("Text_{:?}_{:?}_{:?}", position.x, position.y, position.z)
}

/// Collection name for a marker label
pub fn group_name(label: &str) -> String {
    format!("{}_led", label)
}

/// Handles to everything one marker created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerHandles {
    pub marker: ObjectId,
    pub label: ObjectId,
    pub group: String,
}

/// Compose one labeled marker.
///
/// The label, names and materials are checked before anything is created, so
/// on error the scene is left unchanged and no group is ever half populated.
pub fn compose_marker(
    scene: &mut Scene,
    position: DVec3,
    marker_material: &str,
    label: &str,
    label_material: &str,
) -> Result<MarkerHandles, SceneError> {
    if label.trim().is_empty() {
        return Err(SceneError::EmptyLabel);
    }

    let marker_name = marker_name(position);
    let label_root = label_root(position);
    let group = group_name(label);

    scene.ensure_name_free(NameKind::Object, &marker_name)?;
    scene.ensure_name_free(NameKind::Object, &label_object_name(&label_root))?;
    scene.ensure_name_free(NameKind::Collection, &group)?;
    for key in [marker_material, label_material] {
        if scene.material(key).is_none() {
            return Err(SceneError::UnknownMaterial(key.to_string()));
        }
    }

    let marker = scene.add_cylinder(&marker_name, MARKER_RADIUS, MARKER_DEPTH, position)?;
    scene.assign_material(marker, marker_material)?;

    let label_obj = build_label(scene, &label_root, label)?;
    scene.object_mut(label_obj)?.color = LABEL_COLOR;
    scene.assign_material(label_obj, label_material)?;

    {
        let text = scene.object_mut(label_obj)?;
        text.set_dimensions(LABEL_DIMENSIONS);
        text.location = DVec3::new(
            position.x - LABEL_OFFSET,
            position.y - LABEL_OFFSET,
            LABEL_ELEVATION,
        );
    }

    scene.create_collection(&group)?;
    scene.link_object(&group, marker)?;
    scene.link_object(&group, label_obj)?;

    debug!(label, group = %group, "Composed marker");
    Ok(MarkerHandles {
        marker,
        label: label_obj,
        group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Rgb, ShaderSpec};

    const LED: &str = "LEDShader_255_255_255";
    const TEXT: &str = "TextShader_0_0_0";

    fn scene_with_materials() -> Scene {
        let mut scene = Scene::new();
        let led = ShaderSpec::parse("emissive", Rgb::WHITE, Some(1.0)).unwrap();
        let text = ShaderSpec::parse("diffuse", Rgb::BLACK, None).unwrap();
        scene.rebuild_material(LED, &led);
        scene.rebuild_material(TEXT, &text);
        scene
    }

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < 1e-9
    }

    #[test]
    fn test_names() {
        let pos = DVec3::new(14.0, -1.0, 0.0);
        assert_eq!(marker_name(pos), "LED_14.0_-1.0_0.0");
        assert_eq!(label_root(pos), "Text_14.0_-1.0_0.0");
        assert_eq!(group_name("AL"), "AL_led");
        assert_eq!(marker_name(DVec3::new(1e16, 0.5, 0.0)), "LED_1e16_0.5_0.0");
    }

    #[test]
    fn test_compose_marker() {
        let mut scene = scene_with_materials();
        let pos = DVec3::new(14.0, -1.0, 0.0);
        let handles = compose_marker(&mut scene, pos, LED, "AL", TEXT).unwrap();

        assert_eq!(handles.group, "AL_led");
        let group = scene.collection("AL_led").unwrap();
        assert_eq!(group.objects, vec![handles.marker, handles.label]);
        assert!(scene.root_collection().objects.is_empty());

        let marker = scene.object(handles.marker).unwrap();
        assert_eq!(marker.name, "LED_14.0_-1.0_0.0");
        assert_eq!(marker.location, pos);
        assert_eq!(marker.materials, vec![LED.to_string()]);
        assert!(approx(marker.dimensions(), DVec3::new(1.0, 1.0, 0.5)));

        let label = scene.object(handles.label).unwrap();
        assert_eq!(label.name, "Text_14.0_-1.0_0.0_font");
        assert_eq!(label.color, LABEL_COLOR);
        assert_eq!(label.materials, vec![TEXT.to_string()]);
        assert!(approx(label.location, DVec3::new(13.75, -1.25, 0.3)));
        assert!(approx(label.dimensions(), LABEL_DIMENSIONS));
    }

    #[test]
    fn test_label_box_independent_of_text_length() {
        let mut scene = scene_with_materials();
        for (i, text) in ["X", "WV", "A LONGER LABEL"].iter().enumerate() {
            let pos = DVec3::new(i as f64, 2.0, 0.0);
            let handles = compose_marker(&mut scene, pos, LED, text, TEXT).unwrap();
            let label = scene.object(handles.label).unwrap();
            assert!(approx(label.dimensions(), LABEL_DIMENSIONS));
            assert!(approx(label.location, DVec3::new(i as f64 - 0.25, 1.75, 0.3)));
        }
    }

    #[test]
    fn test_only_expected_state_changes() {
        let mut scene = scene_with_materials();
        compose_marker(&mut scene, DVec3::ZERO, LED, "AL", TEXT).unwrap();
        let before = scene.snapshot();

        compose_marker(&mut scene, DVec3::new(3.0, 3.0, 0.0), LED, "AK", TEXT).unwrap();
        let after = scene.snapshot();

        assert_eq!(after.objects.len(), before.objects.len() + 2);
        assert_eq!(after.collections.len(), before.collections.len() + 1);
        assert_eq!(after.materials, before.materials);
        for object in &before.objects {
            assert!(after.objects.contains(object));
        }
    }

    #[test]
    fn test_duplicate_label_rejected_without_side_effects() {
        let mut scene = scene_with_materials();
        compose_marker(&mut scene, DVec3::ZERO, LED, "AL", TEXT).unwrap();
        let before = scene.snapshot();

        let err = compose_marker(&mut scene, DVec3::ONE, LED, "AL", TEXT).unwrap_err();
        assert!(matches!(
            err,
            SceneError::NameCollision {
                kind: NameKind::Collection,
                ..
            }
        ));
        assert_eq!(scene.snapshot(), before);
    }

    #[test]
    fn test_duplicate_position_rejected() {
        let mut scene = scene_with_materials();
        compose_marker(&mut scene, DVec3::ZERO, LED, "AL", TEXT).unwrap();

        let err = compose_marker(&mut scene, DVec3::ZERO, LED, "AK", TEXT).unwrap_err();
        assert!(matches!(
            err,
            SceneError::NameCollision {
                kind: NameKind::Object,
                ..
            }
        ));
        assert!(scene.collection("AK_led").is_none());
    }

    #[test]
    fn test_blank_label_rejected_without_side_effects() {
        let mut scene = scene_with_materials();
        compose_marker(&mut scene, DVec3::ZERO, LED, "AL", TEXT).unwrap();
        let before = scene.snapshot();

        for label in ["", " ", "\t "] {
            let err = compose_marker(&mut scene, DVec3::ONE, LED, label, TEXT).unwrap_err();
            assert!(matches!(err, SceneError::EmptyLabel));
        }
        assert_eq!(scene.snapshot(), before);
        assert!(scene.collection(" _led").is_none());
    }

    #[test]
    fn test_unknown_material() {
        let mut scene = Scene::new();
        let err = compose_marker(&mut scene, DVec3::ZERO, LED, "AL", TEXT).unwrap_err();
        assert!(matches!(err, SceneError::UnknownMaterial(_)));
        assert_eq!(scene.object_count(), 0);
    }
}
