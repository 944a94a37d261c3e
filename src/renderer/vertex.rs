use bytemuck::{Pod, Zeroable};
use std::mem;

use crate::scene::InstanceData;

/// Per-vertex record of the aggregated vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Per-object record of the instance buffer, fetched through `first_instance`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct InstanceRecord {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl InstanceRecord {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        2 => Float32x3,
        3 => Float32x3
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRecord>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }

    pub fn from_instance(data: &InstanceData) -> Self {
        Self {
            position: data.position.to_array(),
            color: data.color.to_array(),
        }
    }
}

/// Vertex of the full-screen quad used by the lighting pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct ScreenVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl ScreenVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ScreenVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Two triangles covering clip space. UVs have their origin at the top-left.
pub const SCREEN_QUAD: [ScreenVertex; 6] = [
    ScreenVertex {
        position: [-1.0, -1.0, 0.0],
        uv: [0.0, 1.0],
    },
    ScreenVertex {
        position: [1.0, -1.0, 0.0],
        uv: [1.0, 1.0],
    },
    ScreenVertex {
        position: [-1.0, 1.0, 0.0],
        uv: [0.0, 0.0],
    },
    ScreenVertex {
        position: [-1.0, 1.0, 0.0],
        uv: [0.0, 0.0],
    },
    ScreenVertex {
        position: [1.0, -1.0, 0.0],
        uv: [1.0, 1.0],
    },
    ScreenVertex {
        position: [1.0, 1.0, 0.0],
        uv: [1.0, 0.0],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_is_six_floats() {
        assert_eq!(
            Vertex::layout().array_stride,
            (6 * mem::size_of::<f32>()) as wgpu::BufferAddress
        );
    }

    #[test]
    fn instance_stride_is_six_floats_and_steps_per_instance() {
        let layout = InstanceRecord::layout();
        assert_eq!(
            layout.array_stride,
            (6 * mem::size_of::<f32>()) as wgpu::BufferAddress
        );
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn instance_locations_follow_vertex_locations() {
        let vertex_max = Vertex::ATTRS.iter().map(|a| a.shader_location).max();
        let instance_min = InstanceRecord::ATTRS.iter().map(|a| a.shader_location).min();
        assert!(instance_min > vertex_max);
    }
}
