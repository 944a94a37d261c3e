// scene/scene.rs
use std::sync::Arc;

use glam::Vec3;

use crate::renderer::Light;
use crate::scene::lights::{scatter_lights, LightBounds};
use crate::scene::{primitives, Camera, DrawableObject, InstanceData};
use crate::settings::{GridSettings, RenderSettings};

/// Z offset of the first grid layer, so the default camera at the origin
/// starts just outside the grid looking into it.
const GRID_DEPTH_OFFSET: f32 = 10.0;

/// Everything submitted to the renderer: the drawables, the lights and the camera.
pub struct Scene {
    objects: Vec<DrawableObject>,
    lights: Vec<Light>,
    pub camera: Camera,
}

impl Scene {
    pub fn new(objects: Vec<DrawableObject>, lights: Vec<Light>, camera: Camera) -> Self {
        Self {
            objects,
            lights,
            camera,
        }
    }

    /// Demo scene: a grid of prisms and cubes with lights scattered over it.
    pub fn from_settings(settings: &RenderSettings) -> Self {
        let objects = grid_objects(&settings.grid);
        let lights = scatter_lights(
            settings.light_count,
            grid_light_bounds(&settings.grid),
            settings.light_seed,
        );
        log::info!(
            "Built demo scene: {} objects, {} lights",
            objects.len(),
            lights.len()
        );
        Self::new(objects, lights, Camera::default())
    }

    pub fn objects(&self) -> &[DrawableObject] {
        &self.objects
    }

    /// Edits here reach the GPU on the next batch rebuild.
    pub fn objects_mut(&mut self) -> &mut [DrawableObject] {
        &mut self.objects
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }
}

/// Lays out `x * y * z` objects; prisms in even columns, cubes in odd ones.
/// Each axis alternates between a bright and a dim colour channel.
pub fn grid_objects(grid: &GridSettings) -> Vec<DrawableObject> {
    let prism = Arc::new(primitives::triangle_prism());
    let cube = Arc::new(primitives::cube());

    let mut objects = Vec::with_capacity(grid.object_count());
    for i in 0..grid.x {
        for j in 0..grid.y {
            for k in 0..grid.z {
                let position = Vec3::new(
                    i as f32 * grid.spread,
                    j as f32 * grid.spread,
                    k as f32 * grid.spread + GRID_DEPTH_OFFSET,
                );
                let bright = Vec3::new(
                    (i % 2 == 0) as u32 as f32,
                    (j % 2 == 0) as u32 as f32,
                    (k % 2 == 0) as u32 as f32,
                );
                let color = bright * 0.7 + Vec3::splat(0.3);
                let geometry = if i % 2 == 0 { &prism } else { &cube };

                objects.push(DrawableObject::new(
                    Arc::clone(geometry),
                    InstanceData::new(position, color),
                ));
            }
        }
    }
    objects
}

/// Volume spanned by the grid, used to scatter lights through it.
pub fn grid_light_bounds(grid: &GridSettings) -> LightBounds {
    let extent = |count: u32| count as f32 * grid.spread;
    LightBounds {
        min: Vec3::new(0.0, 0.0, GRID_DEPTH_OFFSET),
        max: Vec3::new(
            extent(grid.x),
            extent(grid.y),
            extent(grid.z) + GRID_DEPTH_OFFSET,
        ),
    }
}
