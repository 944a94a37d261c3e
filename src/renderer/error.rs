use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("adapter does not support required features {0:?}")]
    MissingFeatures(wgpu::Features),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
    #[error("shader `{label}` failed validation: {message}")]
    ShaderValidation { label: String, message: String },
    #[error("failed to create `{label}`: {message}")]
    ResourceCreation { label: String, message: String },
    #[error("failed to acquire surface texture: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
