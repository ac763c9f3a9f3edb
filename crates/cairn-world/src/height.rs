//! Octaved 2D height field over gradient noise.

use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::params::NoiseParams;

/// Deterministic `height(x, z)` terrain function.
///
/// Every consumer of terrain height (controller precompute, tests) shares
/// this one implementation: generation and mesh placement depend on
/// byte-identical samples for a given seed.
pub struct HeightField {
    noise: FastNoiseLite,
    octaves: u32,
    persistence: f32,
    lacunarity: f32,
    scale: f32,
    height_scale: f32,
    ground_offset: f32,
}

impl HeightField {
    pub fn new(seed: i32, p: &NoiseParams) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        // Octave frequencies are applied to the coordinates below.
        noise.set_frequency(Some(1.0));
        Self {
            noise,
            octaves: p.octaves,
            persistence: p.persistence,
            lacunarity: p.lacunarity,
            scale: p.scale,
            height_scale: p.height_scale,
            ground_offset: p.ground_offset,
        }
    }

    /// Terrain height at a world column: normalized octave sum scaled and
    /// offset into world Y units.
    pub fn height(&self, x: f32, z: f32) -> f32 {
        let mut total = 0.0f32;
        let mut frequency = 1.0 / self.scale;
        let mut amplitude = 1.0f32;
        let mut max_amplitude = 0.0f32;
        for _ in 0..self.octaves {
            total += self.noise.get_noise_2d(x * frequency, z * frequency) * amplitude;
            max_amplitude += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }
        let normalized = if max_amplitude == 0.0 {
            0.0
        } else {
            total / max_amplitude
        };
        normalized * self.height_scale + self.ground_offset
    }
}
