// renderer/shader.rs
use crate::renderer::internal::validated;
use crate::renderer::lighting::{
    AMBIENT_STRENGTH, ATTENUATION_LINEAR, ATTENUATION_QUADRATIC, BACKGROUND, MAX_LIGHTS,
    SHININESS, SPECULAR_STRENGTH,
};
use crate::renderer::RendererError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShaderSource {
    GBuffer,
    Deferred,
}

impl ShaderSource {
    fn label(self) -> &'static str {
        match self {
            ShaderSource::GBuffer => "gbuffer.wgsl",
            ShaderSource::Deferred => "deferred.wgsl",
        }
    }

    fn body(self) -> &'static str {
        match self {
            ShaderSource::GBuffer => include_str!("../shader/gbuffer.wgsl"),
            ShaderSource::Deferred => include_str!("../shader/deferred.wgsl"),
        }
    }

    /// Full WGSL text: shared constants followed by the shader body.
    pub(crate) fn source(self) -> String {
        format!("{}\n{}", constants(), self.body())
    }
}

// Host-side values the shaders must agree with.
fn constants() -> String {
    let [r, g, b, a] = BACKGROUND;
    format!(
        "const MAX_LIGHTS: u32 = {MAX_LIGHTS}u;\n\
         const AMBIENT_STRENGTH: f32 = {AMBIENT_STRENGTH:?};\n\
         const SPECULAR_STRENGTH: f32 = {SPECULAR_STRENGTH:?};\n\
         const SHININESS: f32 = {SHININESS:?};\n\
         const ATTENUATION_LINEAR: f32 = {ATTENUATION_LINEAR:?};\n\
         const ATTENUATION_QUADRATIC: f32 = {ATTENUATION_QUADRATIC:?};\n\
         const BACKGROUND: vec4<f32> = vec4<f32>({r:?}, {g:?}, {b:?}, {a:?});\n"
    )
}

/// Compiles `source`; WGSL errors are returned instead of reaching the
/// uncaptured error handler.
pub(crate) fn create_module(
    device: &wgpu::Device,
    source: ShaderSource,
) -> Result<wgpu::ShaderModule, RendererError> {
    let label = source.label();
    let module = validated(device, label, |device| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.source().into()),
        })
    })?;
    log::debug!("Compiled shader {}", label);
    Ok(module)
}
