//! Solid text labels

use tracing::debug;

use crate::scene::{ObjectId, Scene, SceneError};
use crate::text::TextCurve;

/// Thickness of an extruded label
pub const LABEL_DEPTH: f64 = 0.3;

/// Name of the label object built from naming root `id`
pub fn label_object_name(id: &str) -> String {
    format!("{}_font", id)
}

/// Build a solid mesh object spelling `text`.
///
/// The text curve becomes a flat polygon mesh which is then extruded by
/// `LABEL_DEPTH` along its face normal. The object is named `{id}_font`.
pub fn build_label(scene: &mut Scene, id: &str, text: &str) -> Result<ObjectId, SceneError> {
    let curve = TextCurve::new(&format!("{}_curve", id), text);
    let object = scene.add_text_curve(&label_object_name(id), curve)?;

    scene.convert_to_mesh(object)?;
    scene.extrude(object, LABEL_DEPTH)?;

    debug!(id, text, "Built label");
    Ok(object)
}
