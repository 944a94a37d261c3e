// renderer/gbuffer.rs
use crate::renderer::internal::{allocated, GeometryBuffers, UniformBuffer};
use crate::renderer::shader::{self, ShaderSource};
use crate::renderer::{GeometryUniform, InstanceRecord, PipelineBuilder, RendererError, Vertex};

pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Render targets written by the geometry pass and read by the lighting pass.
pub struct GBuffer {
    pub position: wgpu::TextureView,
    pub normal: wgpu::TextureView,
    pub albedo: wgpu::TextureView,
    pub depth: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl GBuffer {
    pub(crate) fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> Result<Self, RendererError> {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let sampled =
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;

        Ok(Self {
            position: create_target(device, "GBufferPosition", POSITION_FORMAT, sampled, size)?,
            normal: create_target(device, "GBufferNormal", NORMAL_FORMAT, sampled, size)?,
            albedo: create_target(device, "GBufferAlbedo", ALBEDO_FORMAT, sampled, size)?,
            depth: create_target(
                device,
                "GBufferDepth",
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
                size,
            )?,
            width: size.width,
            height: size.height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &'static str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
    size: wgpu::Extent3d,
) -> Result<wgpu::TextureView, RendererError> {
    let texture = allocated(device, label, |device| {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    })?;
    Ok(texture.create_view(&wgpu::TextureViewDescriptor::default()))
}

/// Geometry pass: one indirect multi-draw over the aggregated buffers.
pub(crate) struct GBufferPass {
    pipeline: wgpu::RenderPipeline,
    camera: UniformBuffer,
    camera_group: wgpu::BindGroup,
}

impl GBufferPass {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self, RendererError> {
        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GeometryCameraLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera = UniformBuffer::new(
            device,
            "GeometryCameraBuffer",
            bytemuck::bytes_of(&GeometryUniform::new()),
        )?;
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GeometryCameraBindGroup"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera.buffer.as_entire_binding(),
            }],
        });

        let module = shader::create_module(device, ShaderSource::GBuffer)?;
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("GBufferPipelineLayout"),
            bind_group_layouts: &[&camera_layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, "GBufferPipeline", &layout, &module)
            .with_vertex_buffer(Vertex::layout())
            .with_vertex_buffer(InstanceRecord::layout())
            .with_color_target(POSITION_FORMAT)
            .with_color_target(NORMAL_FORMAT)
            .with_color_target(ALBEDO_FORMAT)
            .with_depth_stencil(DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
            .build()?;

        Ok(Self {
            pipeline,
            camera,
            camera_group,
        })
    }

    pub(crate) fn set_camera(&self, queue: &wgpu::Queue, uniform: &GeometryUniform) {
        self.camera.write(queue, bytemuck::bytes_of(uniform));
    }

    /// Clears every target, then draws all uploaded commands in one call.
    pub(crate) fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        gbuffer: &GBuffer,
        geometry: &GeometryBuffers,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("GBufferPass"),
            color_attachments: &[
                cleared(&gbuffer.position),
                cleared(&gbuffer.normal),
                cleared(&gbuffer.albedo),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gbuffer.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let count = geometry.command_count();
        if count == 0 {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_group, &[]);
        pass.set_vertex_buffer(0, geometry.vertex_buffer().slice(..));
        pass.set_vertex_buffer(1, geometry.instance_buffer().slice(..));
        pass.multi_draw_indirect(geometry.indirect_buffer(), 0, count);
    }
}

fn cleared(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        depth_slice: None,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            store: wgpu::StoreOp::Store,
        },
    })
}
