// scene/mod.rs

pub mod camera;
pub mod lights;
pub mod objects;
pub mod primitives;
#[allow(clippy::module_inception)]
pub mod scene;

pub use camera::{Camera, CameraController};
pub use lights::{scatter_lights, LightBounds};
pub use objects::{DrawableObject, Geometry, GeometryError, InstanceData, FLOATS_PER_VERTEX};
pub use scene::Scene;
