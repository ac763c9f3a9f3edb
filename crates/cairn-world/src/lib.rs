//! World sizing, deterministic hashing, height sampling, and generation
//! parameters.
#![forbid(unsafe_code)]

pub mod height;
pub mod mix;
pub mod params;

use std::sync::Arc;

pub use height::HeightField;
pub use params::{GenParams, NoiseParams, OreParams, TreeParams, VeinParams};

/// Chunk X/Z footprint in voxels.
pub const CHUNK_SIZE_X: usize = 16;
/// Full world height in voxels; chunks span the whole column.
pub const CHUNK_SIZE_Y: usize = 256;
pub const CHUNK_SIZE_Z: usize = 16;

/// Voxels per chunk.
pub const CHUNK_VOLUME: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;

/// Integer chunk coordinates in the X/Z plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// Chunk containing the given world column (floor division).
    #[inline]
    pub fn of_world(wx: i32, wz: i32) -> Self {
        Self {
            cx: wx.div_euclid(CHUNK_SIZE_X as i32),
            cz: wz.div_euclid(CHUNK_SIZE_Z as i32),
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// World coordinate of this chunk's minimum corner.
    #[inline]
    pub fn base(self) -> (i32, i32) {
        (
            self.cx * CHUNK_SIZE_X as i32,
            self.cz * CHUNK_SIZE_Z as i32,
        )
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dz * dz
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// Immutable per-session world description: the seed plus generation
/// parameters, shared across the tick loop and the workers.
#[derive(Debug)]
pub struct World {
    pub seed: i32,
    pub params: Arc<GenParams>,
}

impl World {
    pub fn new(seed: i32, params: GenParams) -> Self {
        Self {
            seed,
            params: Arc::new(params),
        }
    }

    /// Builds a height sampler seeded for this world. Samplers are cheap;
    /// the controller keeps one, tests make their own.
    pub fn height_field(&self) -> HeightField {
        HeightField::new(self.seed, &self.params.noise)
    }

    /// Precomputes the height sample for every column of a chunk, in the
    /// same x-major order the generator consumes them.
    pub fn column_heights(&self, field: &HeightField, coord: ChunkCoord) -> Vec<f32> {
        let (base_x, base_z) = coord.base();
        let mut out = Vec::with_capacity(CHUNK_SIZE_X * CHUNK_SIZE_Z);
        for x in 0..CHUNK_SIZE_X as i32 {
            for z in 0..CHUNK_SIZE_Z as i32 {
                out.push(field.height((base_x + x) as f32, (base_z + z) as f32));
            }
        }
        out
    }
}
