pub mod batch_cache;
pub mod encoder;
pub mod error;
pub mod gbuffer;
mod internal;
pub mod lighting;
pub mod pipeline_builder;
#[allow(clippy::module_inception)]
mod renderer;
mod shader;
pub mod uniforms;
pub mod vertex;

pub use batch_cache::{
    BatchCache, BatchMode, BatchSignature, BatchUpdate, CacheState, RebuildReason,
};
pub use encoder::{encode, DrawCommand, DrawCommandEncoder, EncodedBatch};
pub use error::RendererError;
pub use gbuffer::GBuffer;
pub use lighting::{pack_lights, Light, LightRecord, MAX_LIGHTS};
pub use pipeline_builder::PipelineBuilder;
pub use renderer::{RenderFrame, Renderer, RendererStats};
pub use uniforms::{GeometryUniform, LightingUniform};
pub use vertex::{InstanceRecord, ScreenVertex, Vertex, SCREEN_QUAD};
