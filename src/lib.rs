//! Printviz - headless 3D model viewer core
//!
//! Loads printable-model meshes (STL, OBJ, 3MF), frames them for display,
//! drives per-axis rotation, and renders frames on a CPU surface for
//! thumbnail synthesis and capture. The crate is the viewer engine; the
//! `printviz` binary wraps it in a small batch CLI.

pub mod loader;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod viewer;

pub use loader::{LoadError, MeshFormat};
pub use mesh::{Aabb, Dimensions, TriangleMesh};
pub use render::{ImageCodec, RenderError};
pub use scene::{Axis, ModelNode, RotationState, Transform};
pub use viewer::{
    CaptureOptions, FrameTiming, ThumbnailOptions, Viewer, ViewerConfig, ViewerError,
    READY_TIMEOUT, THUMBNAIL_AZIMUTHS_DEG,
};
