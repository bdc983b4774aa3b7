//! Mapmark Core - Scene model and marker composition
//!
//! This crate builds a 3D scene of labeled markers standing on a flat map:
//! - Scene graph storage with unique object and collection names
//! - Shader-graph materials, rebuilt on every request
//! - Base surface import with aspect-ratio preservation
//! - Extruded text labels and the per-marker composition pipeline
//! - Marker datasets and the run driver tying it all together

pub mod capability;
pub mod compose;
pub mod dataset;
pub mod label;
pub mod marker;
pub mod material;
pub mod mesh;
pub mod scene;
pub mod surface;
pub mod text;

pub use compose::{compose_scene, ComposeError, RunConfig, RunReport, ShaderRequest};
pub use dataset::{Dataset, DatasetError, MarkerEntry};
pub use marker::{compose_marker, MarkerHandles};
pub use material::{Material, Rgb, ShaderError, ShaderKind, ShaderSpec};
pub use scene::{ObjectId, Scene, SceneError, SceneSnapshot};
pub use surface::{load_surface, SurfaceError};
