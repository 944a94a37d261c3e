use std::mem;

use wgpu::util::DeviceExt;

use crate::renderer::internal::allocated;
use crate::renderer::{DrawCommand, EncodedBatch, InstanceRecord, RendererError, Vertex};

const INITIAL_VERTEX_CAPACITY: u64 = 1024 * 36;
const INITIAL_OBJECT_CAPACITY: u64 = 1024;

/// A GPU buffer that is reallocated at a larger size when an upload does not fit.
struct GrowableBuffer {
    buffer: wgpu::Buffer,
    capacity: u64,
    label: &'static str,
    usage: wgpu::BufferUsages,
}

impl GrowableBuffer {
    fn new(
        device: &wgpu::Device,
        label: &'static str,
        usage: wgpu::BufferUsages,
        capacity: u64,
    ) -> Result<Self, RendererError> {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        let buffer = create_buffer(device, label, usage, capacity)?;
        Ok(Self {
            buffer,
            capacity,
            label,
            usage,
        })
    }

    fn write(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
    ) -> Result<(), RendererError> {
        let required = bytes.len() as u64;
        if required > self.capacity {
            self.grow(device, required)?;
        }
        if !bytes.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytes);
        }
        Ok(())
    }

    fn grow(&mut self, device: &wgpu::Device, required: u64) -> Result<(), RendererError> {
        let new_capacity = required
            .max(self.capacity * 2)
            .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        log::info!(
            "Growing {}: {} -> {} bytes",
            self.label,
            self.capacity,
            new_capacity
        );

        self.buffer = create_buffer(device, self.label, self.usage, new_capacity)?;
        self.capacity = new_capacity;
        Ok(())
    }
}

fn create_buffer(
    device: &wgpu::Device,
    label: &'static str,
    usage: wgpu::BufferUsages,
    size: u64,
) -> Result<wgpu::Buffer, RendererError> {
    allocated(device, label, |device| {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size.max(wgpu::COPY_BUFFER_ALIGNMENT),
            usage,
            mapped_at_creation: false,
        })
    })
}

/// GPU-resident copy of an [`EncodedBatch`]: aggregated vertices, per-object
/// instance records and the indirect command list.
pub(crate) struct GeometryBuffers {
    vertices: GrowableBuffer,
    instances: GrowableBuffer,
    commands: GrowableBuffer,
    command_count: u32,
    vertex_count: u32,
}

impl GeometryBuffers {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self, RendererError> {
        Ok(Self {
            vertices: GrowableBuffer::new(
                device,
                "GeometryVertexBuffer",
                wgpu::BufferUsages::VERTEX,
                INITIAL_VERTEX_CAPACITY * mem::size_of::<Vertex>() as u64,
            )?,
            instances: GrowableBuffer::new(
                device,
                "GeometryInstanceBuffer",
                wgpu::BufferUsages::VERTEX,
                INITIAL_OBJECT_CAPACITY * mem::size_of::<InstanceRecord>() as u64,
            )?,
            commands: GrowableBuffer::new(
                device,
                "GeometryIndirectBuffer",
                wgpu::BufferUsages::INDIRECT,
                INITIAL_OBJECT_CAPACITY * DrawCommand::SIZE,
            )?,
            command_count: 0,
            vertex_count: 0,
        })
    }

    /// Replaces the GPU contents with `batch`. An empty batch uploads nothing
    /// and leaves zero commands to draw.
    pub(crate) fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        batch: &EncodedBatch,
    ) -> Result<(), RendererError> {
        self.command_count = 0;
        self.vertex_count = 0;
        if batch.is_empty() {
            return Ok(());
        }

        self.vertices
            .write(device, queue, bytemuck::cast_slice(&batch.vertices))?;
        self.instances
            .write(device, queue, bytemuck::cast_slice(&batch.instances))?;
        self.commands
            .write(device, queue, bytemuck::cast_slice(&batch.commands))?;

        self.command_count = batch.command_count();
        self.vertex_count = batch.total_vertices();
        Ok(())
    }

    pub(crate) fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertices.buffer
    }

    pub(crate) fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instances.buffer
    }

    pub(crate) fn indirect_buffer(&self) -> &wgpu::Buffer {
        &self.commands.buffer
    }

    pub(crate) fn command_count(&self) -> u32 {
        self.command_count
    }

    pub(crate) fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

/// Fixed-size uniform block written in place each time it changes.
pub(crate) struct UniformBuffer {
    pub(crate) buffer: wgpu::Buffer,
}

impl UniformBuffer {
    pub(crate) fn new(
        device: &wgpu::Device,
        label: &'static str,
        contents: &[u8],
    ) -> Result<Self, RendererError> {
        let buffer = allocated(device, label, |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })?;
        Ok(Self { buffer })
    }

    pub(crate) fn write(&self, queue: &wgpu::Queue, contents: &[u8]) {
        queue.write_buffer(&self.buffer, 0, contents);
    }
}
