// renderer/renderer.rs
use std::sync::Arc;

use winit::{dpi::PhysicalSize, window::Window};

use crate::renderer::gbuffer::GBufferPass;
use crate::renderer::internal::{GeometryBuffers, RenderContext};
use crate::renderer::lighting::LightingPass;
use crate::renderer::{
    BatchCache, BatchMode, BatchUpdate, GBuffer, GeometryUniform, Light, RendererError,
};
use crate::scene::{Camera, DrawableObject};
use crate::settings::RenderSettings;

/// An acquired surface texture with this frame's commands already submitted.
pub struct RenderFrame {
    frame: wgpu::SurfaceTexture,
}

impl RenderFrame {
    pub fn present(self) {
        self.frame.present();
    }
}

/// Counters describing the most recently rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub objects: usize,
    pub draw_commands: u32,
    pub vertices: u32,
    pub rebuilt: bool,
    pub lights: usize,
}

pub struct Renderer {
    context: RenderContext,
    cache: BatchCache,
    geometry: GeometryBuffers,
    gbuffer: GBuffer,
    gbuffer_pass: GBufferPass,
    lighting_pass: LightingPass,
    stats: RendererStats,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        settings: &RenderSettings,
        lights: &[Light],
    ) -> Result<Self, RendererError> {
        let context = RenderContext::new(window, settings).await?;
        let device = &context.device;

        let gbuffer = GBuffer::new(device, context.config.width, context.config.height)?;
        let geometry = GeometryBuffers::new(device)?;
        let gbuffer_pass = GBufferPass::new(device)?;
        let lighting_pass = LightingPass::new(device, context.config.format, &gbuffer, lights)?;

        log::info!(
            "Renderer ready: {}x{}, batch mode {:?}, {} lights",
            context.config.width,
            context.config.height,
            settings.batch_mode,
            lighting_pass.light_count()
        );

        Ok(Self {
            cache: BatchCache::new(settings.batch_mode),
            context,
            geometry,
            gbuffer,
            gbuffer_pass,
            lighting_pass,
            stats: RendererStats::default(),
        })
    }

    /// Resizes the surface and reallocates the GBuffer to match.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) -> Result<(), RendererError> {
        if !self.context.resize(new_size) {
            return Ok(());
        }
        if self.gbuffer.size() == (new_size.width, new_size.height) {
            return Ok(());
        }

        log::debug!("Resizing GBuffer to {}x{}", new_size.width, new_size.height);
        self.gbuffer = GBuffer::new(&self.context.device, new_size.width, new_size.height)?;
        self.lighting_pass
            .resize(&self.context.device, &self.gbuffer);
        Ok(())
    }

    /// Re-applies the current surface configuration after it was lost or outdated.
    pub fn reconfigure(&self) {
        self.context.reconfigure();
    }

    pub fn batch_mode(&self) -> BatchMode {
        self.cache.mode()
    }

    /// Forces the next frame to re-encode and re-upload the batch, picking up
    /// instance data changed since the last rebuild.
    pub fn invalidate_batch(&mut self) {
        self.cache.mark_dirty();
    }

    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    /// Encodes or reuses the batch for `objects`, then records the geometry and
    /// lighting passes and submits them. Call [`RenderFrame::present`] on the result.
    pub fn render(
        &mut self,
        camera: &Camera,
        objects: &[DrawableObject],
    ) -> Result<RenderFrame, RendererError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let device = &self.context.device;
        let queue = &self.context.queue;

        let upload = match self.cache.prepare(objects) {
            BatchUpdate::Rebuild { batch, reason } => {
                log::trace!("Uploading batch ({:?})", reason);
                Some(self.geometry.upload(device, queue, batch))
            }
            BatchUpdate::Reuse => None,
        };
        let rebuilt = match upload {
            Some(Err(err)) => {
                self.cache.upload_failed();
                return Err(err);
            }
            Some(Ok(())) => true,
            None => false,
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("FrameEncoder"),
        });

        let geometry_uniform = GeometryUniform::from_matrices(
            camera.view_matrix(),
            camera.projection_matrix(self.context.aspect_ratio()),
        );
        self.gbuffer_pass.set_camera(queue, &geometry_uniform);
        self.gbuffer_pass
            .record(&mut encoder, &self.gbuffer, &self.geometry);

        self.lighting_pass.prepare(queue, camera.position());
        self.lighting_pass.record(&mut encoder, &view);

        queue.submit(Some(encoder.finish()));

        self.stats = RendererStats {
            objects: objects.len(),
            draw_commands: self.geometry.command_count(),
            vertices: self.geometry.vertex_count(),
            rebuilt,
            lights: self.lighting_pass.light_count(),
        };

        Ok(RenderFrame { frame })
    }
}
