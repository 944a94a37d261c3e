pub mod buffers;
pub mod context;

pub(crate) use buffers::{GeometryBuffers, UniformBuffer};
pub(crate) use context::{allocated, validated, RenderContext};
