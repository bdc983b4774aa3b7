//! Image-import capability
//!
//! Importing images as surfaces needs a decoder backend. It is enabled at most
//! once per process: the first caller of `ensure_image_import` initializes it
//! and every later caller gets the same instance back.

use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use crate::scene::SceneError;

static IMAGE_IMPORT: OnceLock<ImageImporter> = OnceLock::new();

/// Reads image headers for surface import
#[derive(Debug)]
pub struct ImageImporter {
    _private: (),
}

impl ImageImporter {
    /// Pixel width and height of the image at `path`
    pub fn dimensions(&self, path: &Path) -> Result<(u32, u32), SceneError> {
        if !path.exists() {
            return Err(SceneError::MissingResource(path.to_path_buf()));
        }

        image::image_dimensions(path).map_err(|source| SceneError::Image {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Enable the image-import capability if it is not active yet
pub fn ensure_image_import() -> &'static ImageImporter {
    IMAGE_IMPORT.get_or_init(|| {
        info!("Enabled image import");
        ImageImporter { _private: () }
    })
}

/// Whether `ensure_image_import` has run in this process
pub fn image_import_enabled() -> bool {
    IMAGE_IMPORT.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_enabled_once() {
        let first = ensure_image_import();
        let second = ensure_image_import();
        assert!(std::ptr::eq(first, second));
        assert!(image_import_enabled());
    }

    #[test]
    fn test_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("map.png");
        image::RgbImage::new(40, 30).save(&path).unwrap();

        let importer = ensure_image_import();
        assert_eq!(importer.dimensions(&path).unwrap(), (40, 30));
    }

    #[test]
    fn test_missing_file() {
        let importer = ensure_image_import();
        let err = importer.dimensions(Path::new("/nonexistent/map.png")).unwrap_err();
        assert!(matches!(err, SceneError::MissingResource(_)));
    }

    #[test]
    fn test_not_an_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("map.png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = ensure_image_import().dimensions(&path).unwrap_err();
        assert!(matches!(err, SceneError::Image { .. }));
    }
}
