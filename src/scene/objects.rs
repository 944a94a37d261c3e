use std::sync::Arc;

use glam::Vec3;
use thiserror::Error;

use crate::renderer::Vertex;

/// Floats per interleaved vertex record (position3 + normal3).
pub const FLOATS_PER_VERTEX: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("vertex data has {len} floats, which is not a multiple of {stride}")]
    Misaligned { len: usize, stride: usize },
}

/// Immutable triangle-list geometry shared between drawables.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    vertices: Vec<Vertex>,
}

impl Geometry {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    /// Builds geometry from interleaved `[px, py, pz, nx, ny, nz, ...]` data.
    pub fn from_floats(data: &[f32]) -> Result<Self, GeometryError> {
        if data.len() % FLOATS_PER_VERTEX != 0 {
            return Err(GeometryError::Misaligned {
                len: data.len(),
                stride: FLOATS_PER_VERTEX,
            });
        }

        let vertices = data
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|chunk| Vertex {
                position: [chunk[0], chunk[1], chunk[2]],
                normal: [chunk[3], chunk[4], chunk[5]],
            })
            .collect();

        Ok(Self { vertices })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

/// Per-object attributes that end up in the instance buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceData {
    pub position: Vec3,
    pub color: Vec3,
}

impl InstanceData {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self { position, color }
    }
}

/// A single object submitted to the batched pipeline.
///
/// Geometry is fixed for the lifetime of the object; the instance data may be
/// changed between frames, but only reaches the GPU when the batch is rebuilt.
#[derive(Debug, Clone)]
pub struct DrawableObject {
    geometry: Arc<Geometry>,
    pub instance: InstanceData,
}

impl DrawableObject {
    pub fn new(geometry: Arc<Geometry>, instance: InstanceData) -> Self {
        Self { geometry, instance }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn vertex_count(&self) -> u32 {
        self.geometry.vertex_count()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.instance.position = position;
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.instance.color = color;
    }
}
