// renderer/lighting.rs
use std::mem;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::renderer::internal::{allocated, UniformBuffer};
use crate::renderer::shader::{self, ShaderSource};
use crate::renderer::{
    GBuffer, LightingUniform, PipelineBuilder, RendererError, ScreenVertex, SCREEN_QUAD,
};

/// Capacity of the light uniform array.
pub const MAX_LIGHTS: usize = 200;

/// Colour written where no geometry covered the pixel.
pub const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const AMBIENT_STRENGTH: f32 = 0.1;
pub const SPECULAR_STRENGTH: f32 = 0.5;
pub const SHININESS: f32 = 32.0;
pub const ATTENUATION_LINEAR: f32 = 0.09;
pub const ATTENUATION_QUADRATIC: f32 = 0.032;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub power: f32,
}

impl Light {
    pub fn new(position: Vec3, color: Vec3, power: f32) -> Self {
        Self {
            position,
            color,
            power,
        }
    }
}

/// One element of the light uniform array, padded to the 16-byte rows of
/// the uniform address space.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct LightRecord {
    /// xyz = world position, w unused
    pub position: [f32; 4],
    /// rgb = colour, a = power
    pub color_power: [f32; 4],
}

const _: () = assert!(mem::size_of::<LightRecord>() == 32);
const _: () = assert!(mem::offset_of!(LightRecord, position) == 0);
const _: () = assert!(mem::offset_of!(LightRecord, color_power) == 16);

impl From<&Light> for LightRecord {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.extend(0.0).to_array(),
            color_power: light.color.extend(light.power).to_array(),
        }
    }
}

/// Packs `lights` into exactly [`MAX_LIGHTS`] records, zero-filling unused
/// slots. Lights beyond the capacity are dropped.
pub fn pack_lights(lights: &[Light]) -> Vec<LightRecord> {
    if lights.len() > MAX_LIGHTS {
        log::warn!(
            "{} lights requested, only the first {} are uploaded",
            lights.len(),
            MAX_LIGHTS
        );
    }

    let mut records = vec![LightRecord::zeroed(); MAX_LIGHTS];
    for (record, light) in records.iter_mut().zip(lights) {
        *record = LightRecord::from(light);
    }
    records
}

/// Full-screen pass that shades the GBuffer with the light list.
pub(crate) struct LightingPass {
    pipeline: wgpu::RenderPipeline,
    gbuffer_layout: wgpu::BindGroupLayout,
    gbuffer_group: wgpu::BindGroup,
    lights_group: wgpu::BindGroup,
    // Kept alive for the bind group; written once at construction.
    _lights: UniformBuffer,
    frame: UniformBuffer,
    quad: wgpu::Buffer,
    light_count: usize,
}

impl LightingPass {
    pub(crate) fn new(
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        gbuffer: &GBuffer,
        lights: &[Light],
    ) -> Result<Self, RendererError> {
        let gbuffer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GBufferReadLayout"),
            entries: &[
                gbuffer_texture_entry(0),
                gbuffer_texture_entry(1),
                gbuffer_texture_entry(2),
            ],
        });

        let lights_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("LightsBindLayout"),
            entries: &[uniform_entry(0), uniform_entry(1)],
        });

        let light_records = pack_lights(lights);
        let lights_buffer =
            UniformBuffer::new(device, "LightsBuffer", bytemuck::cast_slice(&light_records))?;
        let frame = UniformBuffer::new(
            device,
            "LightingUniformBuffer",
            bytemuck::bytes_of(&LightingUniform::new(Vec3::ZERO, 0)),
        )?;

        let lights_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("LightsBindGroup"),
            layout: &lights_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lights_buffer.buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: frame.buffer.as_entire_binding(),
                },
            ],
        });

        let gbuffer_group = create_gbuffer_group(device, &gbuffer_layout, gbuffer);

        let quad = allocated(device, "ScreenQuadBuffer", |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("ScreenQuadBuffer"),
                contents: bytemuck::cast_slice(&SCREEN_QUAD),
                usage: wgpu::BufferUsages::VERTEX,
            })
        })?;

        let module = shader::create_module(device, ShaderSource::Deferred)?;
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("LightingPipelineLayout"),
            bind_group_layouts: &[&gbuffer_layout, &lights_layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, "LightingPipeline", &layout, &module)
            .with_vertex_buffer(ScreenVertex::layout())
            .with_color_target(target_format)
            .with_no_culling()
            .build()?;

        Ok(Self {
            pipeline,
            gbuffer_layout,
            gbuffer_group,
            lights_group,
            _lights: lights_buffer,
            frame,
            quad,
            light_count: lights.len().min(MAX_LIGHTS),
        })
    }

    /// Re-targets the pass at freshly allocated GBuffer textures.
    pub(crate) fn resize(&mut self, device: &wgpu::Device, gbuffer: &GBuffer) {
        self.gbuffer_group = create_gbuffer_group(device, &self.gbuffer_layout, gbuffer);
    }

    pub(crate) fn light_count(&self) -> usize {
        self.light_count
    }

    pub(crate) fn prepare(&self, queue: &wgpu::Queue, camera_position: Vec3) {
        let uniform = LightingUniform::new(camera_position, self.light_count);
        self.frame.write(queue, bytemuck::bytes_of(&uniform));
    }

    pub(crate) fn record(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let [r, g, b, a] = BACKGROUND.map(f64::from);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("LightingPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.gbuffer_group, &[]);
        pass.set_bind_group(1, &self.lights_group, &[]);
        pass.set_vertex_buffer(0, self.quad.slice(..));
        pass.draw(0..SCREEN_QUAD.len() as u32, 0..1);
    }
}

fn gbuffer_texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn create_gbuffer_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    gbuffer: &GBuffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("GBufferReadBindGroup"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&gbuffer.position),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&gbuffer.normal),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&gbuffer.albedo),
            },
        ],
    })
}
