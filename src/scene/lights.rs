use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::renderer::Light;

/// Axis-aligned volume that procedural lights are scattered in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for LightBounds {
    fn default() -> Self {
        Self {
            min: Vec3::new(0.0, 0.0, 10.0),
            max: Vec3::new(100.0, 100.0, 110.0),
        }
    }
}

/// Places `count` white lights uniformly inside `bounds`.
///
/// A fixed `seed` gives a reproducible layout; `None` seeds from entropy.
pub fn scatter_lights(count: usize, bounds: LightBounds, seed: Option<u64>) -> Vec<Light> {
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    (0..count)
        .map(|_| {
            let position = Vec3::new(
                sample_axis(&mut rng, bounds.min.x, bounds.max.x),
                sample_axis(&mut rng, bounds.min.y, bounds.max.y),
                sample_axis(&mut rng, bounds.min.z, bounds.max.z),
            );
            Light::new(position, Vec3::ONE, 1.0)
        })
        .collect()
}

fn sample_axis(rng: &mut SmallRng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}
