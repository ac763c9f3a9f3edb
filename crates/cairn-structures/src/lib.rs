//! Tree geometry as data: trunk column, layered canopy, chunk footprint.
//!
//! The streaming controller decides when and whether to write a tree; this
//! crate only answers which cells a tree at a given anchor touches, in a
//! fixed placement order so overlapping canopies resolve deterministically.
#![forbid(unsafe_code)]

use cairn_world::{CHUNK_SIZE_Y, ChunkCoord};

/// Horizontal canopy reach from the trunk.
pub const CANOPY_RADIUS: i32 = 2;

#[derive(Clone, Copy, Debug)]
pub struct TreeShape {
    pub base_x: i32,
    pub base_y: i32,
    pub base_z: i32,
    pub trunk_height: i32,
}

impl TreeShape {
    pub fn new(base_x: i32, base_y: i32, base_z: i32, trunk_height: i32) -> Self {
        Self {
            base_x,
            base_y,
            base_z,
            trunk_height,
        }
    }

    /// A tree needs its trunk fully inside the world column and cannot
    /// root at the floor.
    pub fn fits_world(&self) -> bool {
        self.base_y > 0 && self.base_y + self.trunk_height < CHUNK_SIZE_Y as i32
    }

    /// LOG cells, bottom-up.
    pub fn trunk_cells(&self) -> Vec<(i32, i32, i32)> {
        (0..self.trunk_height)
            .map(|dy| (self.base_x, self.base_y + dy, self.base_z))
            .collect()
    }

    fn canopy_base(&self) -> i32 {
        self.base_y + self.trunk_height / 2
    }

    #[inline]
    fn is_trunk(&self, x: i32, y: i32, z: i32) -> bool {
        x == self.base_x
            && z == self.base_z
            && y >= self.base_y
            && y < self.base_y + self.trunk_height
    }

    /// LEAVES cells in placement order: two 5×5-minus-corners layers, one
    /// 3×3 ring, then a plus-shaped cap. Trunk cells are excluded; cells
    /// above the world ceiling are dropped.
    pub fn canopy_cells(&self) -> Vec<(i32, i32, i32)> {
        let mut cells = Vec::new();
        let base = self.canopy_base();
        let top = CHUNK_SIZE_Y as i32;

        for layer in 0..2 {
            let y = base + layer;
            if y >= top {
                continue;
            }
            for dx in -CANOPY_RADIUS..=CANOPY_RADIUS {
                for dz in -CANOPY_RADIUS..=CANOPY_RADIUS {
                    if dx.abs() == CANOPY_RADIUS && dz.abs() == CANOPY_RADIUS {
                        continue;
                    }
                    let (x, z) = (self.base_x + dx, self.base_z + dz);
                    if self.is_trunk(x, y, z) {
                        continue;
                    }
                    cells.push((x, y, z));
                }
            }
        }

        let y = base + 2;
        if y < top {
            for dx in -1..=1 {
                for dz in -1..=1 {
                    if dx == 0 && dz == 0 {
                        continue;
                    }
                    cells.push((self.base_x + dx, y, self.base_z + dz));
                }
            }
        }

        let y = base + 3;
        if y < top {
            for (dx, dz) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
                let (x, z) = (self.base_x + dx, self.base_z + dz);
                if self.is_trunk(x, y, z) {
                    continue;
                }
                cells.push((x, y, z));
            }
        }

        cells
    }

    /// Every chunk the trunk or canopy can touch; the controller requires
    /// all of them loaded before writing anything.
    pub fn footprint(&self) -> Vec<ChunkCoord> {
        let min = ChunkCoord::of_world(self.base_x - CANOPY_RADIUS, self.base_z - CANOPY_RADIUS);
        let max = ChunkCoord::of_world(self.base_x + CANOPY_RADIUS, self.base_z + CANOPY_RADIUS);
        let mut out = Vec::new();
        for cx in min.cx..=max.cx {
            for cz in min.cz..=max.cz {
                out.push(ChunkCoord::new(cx, cz));
            }
        }
        out
    }
}
