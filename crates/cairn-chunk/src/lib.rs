//! Dense chunk voxel buffer and the chunk generator.
#![forbid(unsafe_code)]

mod generate;

pub use generate::{ChunkGenerateResult, TreeAnchor, generate_chunk, grow_vein};

use cairn_blocks::Block;
use cairn_world::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, CHUNK_VOLUME, ChunkCoord};

/// One chunk's voxels, indexed `y*(SX*SZ) + z*SX + x`.
///
/// Coordinate queries are tolerant: anything outside the grid reads as air
/// and writes outside the grid are ignored. Callers treat "outside" the
/// same as "unloaded neighbor".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkBuf {
    pub coord: ChunkCoord,
    pub blocks: Vec<Block>,
}

impl ChunkBuf {
    pub fn new_air(coord: ChunkCoord) -> Self {
        Self {
            coord,
            blocks: vec![Block::Air; CHUNK_VOLUME],
        }
    }

    /// Rehydrates a buffer from raw block storage, padding or truncating to
    /// the fixed chunk volume.
    pub fn from_blocks(coord: ChunkCoord, mut blocks: Vec<Block>) -> Self {
        if blocks.len() != CHUNK_VOLUME {
            blocks.resize(CHUNK_VOLUME, Block::Air);
        }
        Self { coord, blocks }
    }

    #[inline]
    pub fn idx(x: usize, y: usize, z: usize) -> usize {
        y * (CHUNK_SIZE_X * CHUNK_SIZE_Z) + z * CHUNK_SIZE_X + x
    }

    #[inline]
    fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        (0..CHUNK_SIZE_X as i32).contains(&x)
            && (0..CHUNK_SIZE_Y as i32).contains(&y)
            && (0..CHUNK_SIZE_Z as i32).contains(&z)
    }

    /// Reads a voxel by local coordinates; out of range reads as air.
    #[inline]
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Block {
        if !Self::in_bounds(x, y, z) {
            return Block::Air;
        }
        self.blocks[Self::idx(x as usize, y as usize, z as usize)]
    }

    /// Writes a voxel by local coordinates; out of range is a no-op.
    /// Returns whether the write landed.
    #[inline]
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, b: Block) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }
        self.blocks[Self::idx(x as usize, y as usize, z as usize)] = b;
        true
    }

    /// Vein-protected write: refuses to replace anything that is not plain
    /// terrain, so a later vein never clobbers earlier ore or special
    /// blocks.
    #[inline]
    pub fn set_vein(&mut self, x: i32, y: i32, z: i32, b: Block) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }
        let idx = Self::idx(x as usize, y as usize, z as usize);
        if !self.blocks[idx].is_vein_overwritable() {
            return false;
        }
        self.blocks[idx] = b;
        true
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.blocks.iter().any(|b| *b != Block::Air)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_reads_are_air_and_writes_are_dropped() {
        let mut buf = ChunkBuf::new_air(ChunkCoord::new(0, 0));
        assert_eq!(buf.get_local(-1, 0, 0), Block::Air);
        assert_eq!(buf.get_local(0, 256, 0), Block::Air);
        assert!(!buf.set_local(16, 0, 0, Block::Stone));
        assert!(!buf.has_non_air());
        assert!(buf.set_local(15, 255, 15, Block::Stone));
        assert_eq!(buf.get_local(15, 255, 15), Block::Stone);
    }

    #[test]
    fn vein_writes_respect_protection() {
        let mut buf = ChunkBuf::new_air(ChunkCoord::new(0, 0));
        buf.set_local(1, 1, 1, Block::Stone);
        assert!(buf.set_vein(1, 1, 1, Block::IronOre));
        // A second vein cannot take the same voxel.
        assert!(!buf.set_vein(1, 1, 1, Block::CoalOre));
        assert_eq!(buf.get_local(1, 1, 1), Block::IronOre);
    }

    #[test]
    fn from_blocks_pads_short_storage() {
        let buf = ChunkBuf::from_blocks(ChunkCoord::new(2, 3), vec![Block::Dirt; 10]);
        assert_eq!(buf.blocks.len(), CHUNK_VOLUME);
        assert_eq!(buf.get_local(0, 0, 0), Block::Dirt);
    }
}
