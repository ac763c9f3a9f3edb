//! Chunk generation: terrain fill, ore veins, tree candidates.
//!
//! Everything here is a pure function of `(coord, heights, seed, params)`;
//! workers can regenerate any chunk at any time and get byte-identical
//! results.

use cairn_blocks::Block;
use cairn_world::mix::{self, SALT_TREE, SALT_VEIN_ATTEMPT, SALT_VEIN_PREFIX};
use cairn_world::{
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, ChunkCoord, GenParams, VeinParams,
};

use crate::ChunkBuf;

/// World-space position where a trunk base should later be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeAnchor {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

#[derive(Clone, Debug)]
pub struct ChunkGenerateResult {
    pub buf: ChunkBuf,
    pub trees: Vec<TreeAnchor>,
}

/// Fills a chunk from precomputed height samples (one per column, x-major)
/// and emits tree anchors for the streaming controller to materialize.
pub fn generate_chunk(
    coord: ChunkCoord,
    heights: &[f32],
    seed: i32,
    params: &GenParams,
) -> ChunkGenerateResult {
    debug_assert_eq!(heights.len(), CHUNK_SIZE_X * CHUNK_SIZE_Z);
    let mut buf = ChunkBuf::new_air(coord);
    let (base_x, base_z) = coord.base();

    // Terrain: grass surface, 3 dirt below, stone down to a forced stone
    // floor at y == 0.
    let mut column = 0usize;
    for x in 0..CHUNK_SIZE_X as i32 {
        for z in 0..CHUNK_SIZE_Z as i32 {
            let surface = heights[column].floor() as i32;
            column += 1;
            let top = surface.clamp(0, CHUNK_SIZE_Y as i32 - 1);
            for y in (0..=top).rev() {
                let block = if y == 0 {
                    Block::Stone
                } else if y == surface {
                    Block::Grass
                } else if y >= surface - 3 && y < surface {
                    Block::Dirt
                } else {
                    Block::Stone
                };
                buf.set_local(x, y, z, block);
            }
        }
    }

    // Ore veins: one deterministic attempt draw per stone voxel, ore table
    // scanned rarest-first, first match wins.
    for y in 0..CHUNK_SIZE_Y as i32 {
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                if buf.get_local(x, y, z) != Block::Stone {
                    continue;
                }
                let (wx, wz) = (base_x + x, base_z + z);
                let attempt = mix::unit_f64(mix::hash_coords(
                    wx,
                    y,
                    wz,
                    seed,
                    SALT_VEIN_ATTEMPT,
                ));
                for ore in &params.ores {
                    let prob =
                        params.veins.attempt_chance * ore.chance_scale * ore.y_weight(y);
                    if attempt < prob {
                        grow_vein(&mut buf, (x, y, z), ore.block, seed, &params.veins);
                        break;
                    }
                }
            }
        }
    }

    // Tree candidates: grass surface with clearance, height-independent
    // draw so a column's tree roll does not shift with terrain tweaks.
    let mut trees = Vec::new();
    let mut column = 0usize;
    for x in 0..CHUNK_SIZE_X as i32 {
        for z in 0..CHUNK_SIZE_Z as i32 {
            let surface = heights[column].floor() as i32;
            column += 1;
            if surface < 0 || surface >= CHUNK_SIZE_Y as i32 {
                continue;
            }
            if buf.get_local(x, surface, z) != Block::Grass {
                continue;
            }
            if surface + params.trees.min_height >= CHUNK_SIZE_Y as i32 {
                continue;
            }
            let (wx, wz) = (base_x + x, base_z + z);
            let draw = mix::unit_f64(mix::hash_coords(wx, 0, wz, seed, SALT_TREE));
            if draw < params.trees.probability {
                trees.push(TreeAnchor {
                    x: wx,
                    y: surface + 1,
                    z: wz,
                });
            }
        }
    }

    ChunkGenerateResult { buf, trees }
}

/// Grows one ore vein by a bounded random walk from `start` (local
/// coordinates). The walk's size target and direction stream derive from a
/// single hash of the start voxel, so veins are stable across regeneration.
/// Returns the number of voxels converted.
pub fn grow_vein(
    buf: &mut ChunkBuf,
    start: (i32, i32, i32),
    ore: Block,
    seed: i32,
    veins: &VeinParams,
) -> u32 {
    let salt = format!("{}{}", SALT_VEIN_PREFIX, ore.id());
    let vein_seed = mix::hash_coords(start.0, start.1, start.2, seed, &salt);
    let span = veins.max_size.saturating_sub(veins.min_size) + 1;
    let target =
        veins.min_size + (mix::unit_f64(vein_seed.wrapping_add(1)) * f64::from(span)) as u32;

    let (mut x, mut y, mut z) = start;
    let mut placed = 0u32;
    for i in 0..veins.iterations {
        if placed >= target {
            break;
        }
        if buf.get_local(x, y, z) == Block::Stone && buf.set_vein(x, y, z, ore) {
            placed += 1;
        }
        let step = mix::unit_f64(vein_seed.wrapping_add(i.wrapping_mul(3)));
        match (step * 6.0) as u32 {
            0 => x += 1,
            1 => x -= 1,
            2 => y += 1,
            3 => y -= 1,
            4 => z += 1,
            _ => z -= 1,
        }
        x = x.clamp(0, CHUNK_SIZE_X as i32 - 1);
        y = y.clamp(0, CHUNK_SIZE_Y as i32 - 1);
        z = z.clamp(0, CHUNK_SIZE_Z as i32 - 1);
    }
    placed
}
