// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::renderer::MAX_LIGHTS;

/// Camera matrices consumed by the geometry pass vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct GeometryUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl GeometryUniform {
    pub fn new() -> Self {
        Self::from_matrices(Mat4::IDENTITY, Mat4::IDENTITY)
    }

    pub fn from_matrices(view: Mat4, projection: Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

impl Default for GeometryUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-frame values of the lighting pass. `light_count` is clamped to the
/// capacity of the light buffer so the shader loop never reads past it.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct LightingUniform {
    pub camera_position: [f32; 3],
    pub light_count: u32,
}

impl LightingUniform {
    pub fn new(camera_position: Vec3, light_count: usize) -> Self {
        Self {
            camera_position: camera_position.to_array(),
            light_count: light_count.min(MAX_LIGHTS) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_uniform_is_two_mat4() {
        assert_eq!(std::mem::size_of::<GeometryUniform>(), 128);
    }

    #[test]
    fn lighting_uniform_packs_count_after_vec3() {
        // vec3<f32> + u32 share one 16-byte row in WGSL.
        assert_eq!(std::mem::size_of::<LightingUniform>(), 16);
        assert_eq!(std::mem::offset_of!(LightingUniform, light_count), 12);
    }

    #[test]
    fn light_count_is_clamped_to_capacity() {
        let uniform = LightingUniform::new(Vec3::ZERO, MAX_LIGHTS + 7);
        assert_eq!(uniform.light_count as usize, MAX_LIGHTS);

        let uniform = LightingUniform::new(Vec3::ONE, 0);
        assert_eq!(uniform.light_count, 0);
        assert_eq!(uniform.camera_position, [1.0, 1.0, 1.0]);
    }
}
