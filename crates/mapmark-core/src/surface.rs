//! Base surface loading
//!
//! The base surface is the map image laid flat at the world origin. Its width
//! is always the requested size and its depth follows the image aspect ratio.

use glam::DVec3;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::capability::ensure_image_import;
use crate::scene::{ObjectId, Scene, SceneError};

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("Surface size must be positive, got {0}")]
    InvalidSize(f64),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Import `image_path` as a flat surface `max_size_dim` wide.
///
/// A missing image is not an error: it is logged and `Ok(None)` is returned
/// without touching the scene.
pub fn load_surface(
    scene: &mut Scene,
    max_size_dim: f64,
    image_path: &Path,
) -> Result<Option<ObjectId>, SurfaceError> {
    if !(max_size_dim > 0.0 && max_size_dim.is_finite()) {
        return Err(SurfaceError::InvalidSize(max_size_dim));
    }

    if !image_path.exists() {
        warn!(path = %image_path.display(), "Surface image not found, continuing without it");
        return Ok(None);
    }

    let importer = ensure_image_import();
    let (id, (width, height)) = scene.import_image_as_surface(importer, image_path)?;

    let aspect = f64::from(height) / f64::from(width);
    let dimensions = DVec3::new(max_size_dim, max_size_dim * aspect, 0.0);

    let surface = scene.object_mut(id)?;
    surface.set_dimensions(dimensions);
    surface.location = DVec3::ZERO;

    info!(
        width = dimensions.x,
        depth = dimensions.y,
        "Placed base surface at origin"
    );
    Ok(Some(id))
}
