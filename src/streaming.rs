//! Chunk streaming controller: drives loading, eviction, tree
//! materialization, and remeshing around the viewer, one tick at a time.

use std::collections::VecDeque;
use std::sync::Arc;

use cairn_blocks::Block;
use cairn_chunk::{ChunkBuf, TreeAnchor};
use cairn_geom::Vec3;
use cairn_mesh::GeometryBatch;
use cairn_runtime::{Job, JobKind, JobOut, Runtime};
use cairn_structures::TreeShape;
use cairn_world::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, ChunkCoord, HeightField, World};
use hashbrown::{HashMap, HashSet};

/// The chunk coordinates that must be loaded for a viewer standing in
/// `center` with the given render distance: a filled disc, not a square.
pub fn required_set(center: ChunkCoord, radius: i32) -> HashSet<ChunkCoord> {
    let mut out = HashSet::new();
    for dx in -radius..=radius {
        for dz in -radius..=radius {
            if within_disc(dx, dz, radius) {
                out.insert(center.offset(dx, dz));
            }
        }
    }
    out
}

// Widened so a render distance near i32::MAX's square root cannot
// overflow the comparison.
#[inline]
fn within_disc(dx: i32, dz: i32, radius: i32) -> bool {
    i64::from(dx) * i64::from(dx) + i64::from(dz) * i64::from(dz)
        <= i64::from(radius) * i64::from(radius)
}

/// Per-chunk state. `buf` is `None` from dispatch until the generation
/// result lands (and again after a failed generation, which the next tick's
/// required-set scan retries).
struct ChunkEntry {
    buf: Option<ChunkBuf>,
    batches: Vec<GeometryBatch>,
}

pub struct ChunkStreamer {
    world: Arc<World>,
    runtime: Runtime,
    field: HeightField,
    render_distance: i32,
    chunks: HashMap<ChunkCoord, ChunkEntry>,
    generating: HashSet<ChunkCoord>,
    dirty: HashSet<ChunkCoord>,
    remeshing: HashSet<ChunkCoord>,
    pending_trees: VecDeque<TreeAnchor>,
    next_job_id: u64,
}

impl ChunkStreamer {
    pub fn new(world: Arc<World>, runtime: Runtime, render_distance: i32) -> Self {
        let field = world.height_field();
        Self {
            world,
            runtime,
            field,
            render_distance,
            chunks: HashMap::new(),
            generating: HashSet::new(),
            dirty: HashSet::new(),
            remeshing: HashSet::new(),
            pending_trees: VecDeque::new(),
            next_job_id: 0,
        }
    }

    /// One streaming step: drain worker results, grow at most one pending
    /// tree, dispatch at most one remesh, then reconcile the loaded set
    /// against the viewer position.
    pub fn tick(&mut self, viewer: Vec3) {
        self.integrate_results();
        self.materialize_one_tree();
        self.dispatch_one_remesh();

        let center = ChunkCoord::of_world(viewer.x.floor() as i32, viewer.z.floor() as i32);
        let required = required_set(center, self.render_distance);
        self.evict_outside(&required);
        self.request_missing(&required);
    }

    fn integrate_results(&mut self) {
        for out in self.runtime.drain_results() {
            log::trace!(
                "job {} ({:?}) for ({},{}) took {} ms",
                out.job_id,
                out.kind,
                out.coord.cx,
                out.coord.cz,
                out.t_total_ms
            );
            match out.kind {
                JobKind::Generate => self.integrate_generated(out),
                JobKind::Remesh => {
                    // Stale results for evicted chunks just fall through.
                    if self.remeshing.remove(&out.coord)
                        && let Some(entry) = self.chunks.get_mut(&out.coord)
                        && entry.buf.is_some()
                    {
                        entry.batches = out.batches;
                    }
                }
            }
        }
    }

    fn integrate_generated(&mut self, out: JobOut) {
        if !self.generating.remove(&out.coord) {
            log::debug!(
                "discarding generation result for untracked chunk ({},{})",
                out.coord.cx,
                out.coord.cz
            );
            return;
        }
        let Some(entry) = self.chunks.get_mut(&out.coord) else {
            return;
        };
        if out.buf.is_none() {
            log::warn!(
                "chunk ({},{}) generation returned no payload",
                out.coord.cx,
                out.coord.cz
            );
        }
        entry.buf = out.buf;
        entry.batches = out.batches;
        self.pending_trees.extend(out.trees);
    }

    /// Grows at most one queued tree. A candidate is dropped silently when
    /// its ground has changed or part of its footprint is not loaded.
    fn materialize_one_tree(&mut self) {
        let Some(anchor) = self.pending_trees.pop_front() else {
            return;
        };
        let ground = self.get_block(anchor.x, anchor.y - 1, anchor.z);
        if ground != Block::Grass && ground != Block::Dirt {
            return;
        }
        let shape = TreeShape::new(
            anchor.x,
            anchor.y,
            anchor.z,
            self.world.params.trees.trunk_height,
        );
        if !shape.fits_world() {
            return;
        }
        if !shape.footprint().iter().all(|c| self.is_chunk_data_ready(*c)) {
            return;
        }
        for (x, y, z) in shape.trunk_cells() {
            self.set_block(x, y, z, Block::Log);
        }
        for (x, y, z) in shape.canopy_cells() {
            if self.get_block(x, y, z) == Block::Air {
                self.set_block(x, y, z, Block::Leaves);
            }
        }
    }

    /// Sends at most one dirty chunk back to the workers, skipping chunks
    /// that are mid-generation or already have a remesh in flight.
    fn dispatch_one_remesh(&mut self) {
        let Some(coord) = self.dirty.iter().copied().find(|c| {
            !self.generating.contains(c)
                && !self.remeshing.contains(c)
                && self.chunks.get(c).is_some_and(|e| e.buf.is_some())
        }) else {
            return;
        };
        self.dirty.remove(&coord);
        let Some(blocks) = self
            .chunks
            .get(&coord)
            .and_then(|e| e.buf.as_ref())
            .map(|b| b.blocks.clone())
        else {
            return;
        };
        self.remeshing.insert(coord);
        let job_id = self.next_job_id();
        self.runtime.submit(Job::Remesh {
            coord,
            blocks,
            job_id,
        });
    }

    fn evict_outside(&mut self, required: &HashSet<ChunkCoord>) {
        let doomed: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .filter(|c| {
                !required.contains(*c)
                    && !self.generating.contains(*c)
                    && !self.remeshing.contains(*c)
                    && !self.dirty.contains(*c)
            })
            .copied()
            .collect();
        for coord in doomed {
            self.chunks.remove(&coord);
            log::trace!("evicted chunk ({},{})", coord.cx, coord.cz);
        }
    }

    fn request_missing(&mut self, required: &HashSet<ChunkCoord>) {
        for &coord in required {
            let loaded = self.chunks.get(&coord).is_some_and(|e| e.buf.is_some());
            if loaded || self.generating.contains(&coord) {
                continue;
            }
            // Mark before dispatch so a re-entrant tick cannot double-send.
            self.generating.insert(coord);
            self.chunks.entry(coord).or_insert(ChunkEntry {
                buf: None,
                batches: Vec::new(),
            });
            let heights = self.world.column_heights(&self.field, coord);
            let job_id = self.next_job_id();
            self.runtime.submit(Job::Generate {
                coord,
                heights,
                job_id,
            });
        }
    }

    fn next_job_id(&mut self) -> u64 {
        self.next_job_id += 1;
        self.next_job_id
    }

    /// World-space block read; anything unloaded or out of the vertical
    /// range reads as air.
    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        if wy < 0 || wy >= CHUNK_SIZE_Y as i32 {
            return Block::Air;
        }
        let coord = ChunkCoord::of_world(wx, wz);
        let Some(buf) = self.chunks.get(&coord).and_then(|e| e.buf.as_ref()) else {
            return Block::Air;
        };
        let (base_x, base_z) = coord.base();
        buf.get_local(wx - base_x, wy, wz - base_z)
    }

    /// World-space block write. Returns false for unloaded chunks, out of
    /// range Y, or a write that would not change anything. A landed write
    /// marks the owning chunk dirty, plus any neighbor sharing the edited
    /// cell's boundary face.
    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> bool {
        if wy < 0 || wy >= CHUNK_SIZE_Y as i32 {
            return false;
        }
        let coord = ChunkCoord::of_world(wx, wz);
        let Some(buf) = self
            .chunks
            .get_mut(&coord)
            .and_then(|e| e.buf.as_mut())
        else {
            return false;
        };
        let (base_x, base_z) = coord.base();
        let (lx, lz) = (wx - base_x, wz - base_z);
        if buf.get_local(lx, wy, lz) == block {
            return false;
        }
        if !buf.set_local(lx, wy, lz, block) {
            return false;
        }

        let mut touched = vec![coord];
        if lx == 0 {
            touched.push(coord.offset(-1, 0));
        }
        if lx == CHUNK_SIZE_X as i32 - 1 {
            touched.push(coord.offset(1, 0));
        }
        if lz == 0 {
            touched.push(coord.offset(0, -1));
        }
        if lz == CHUNK_SIZE_Z as i32 - 1 {
            touched.push(coord.offset(0, 1));
        }
        for c in touched {
            if self.chunks.contains_key(&c) {
                self.dirty.insert(c);
            }
        }
        true
    }

    pub fn is_chunk_data_ready(&self, coord: ChunkCoord) -> bool {
        self.chunks.get(&coord).is_some_and(|e| e.buf.is_some())
            && !self.generating.contains(&coord)
    }

    /// Highest non-air Y in the column, or -1 when the column is empty or
    /// its chunk is not loaded.
    pub fn highest_solid_y(&self, wx: i32, wz: i32) -> i32 {
        let coord = ChunkCoord::of_world(wx, wz);
        let Some(buf) = self.chunks.get(&coord).and_then(|e| e.buf.as_ref()) else {
            return -1;
        };
        let (base_x, base_z) = coord.base();
        let (lx, lz) = (wx - base_x, wz - base_z);
        for y in (0..CHUNK_SIZE_Y as i32).rev() {
            if buf.get_local(lx, y, lz) != Block::Air {
                return y;
            }
        }
        -1
    }

    /// Geometry for every chunk that is loaded and not mid-rebuild, for the
    /// rendering collaborator to consume.
    pub fn visible_batches(&self) -> impl Iterator<Item = (ChunkCoord, &[GeometryBatch])> {
        self.chunks.iter().filter_map(|(coord, entry)| {
            if entry.buf.is_some() && !self.generating.contains(coord) {
                Some((*coord, entry.batches.as_slice()))
            } else {
                None
            }
        })
    }

    pub fn loaded_chunks(&self) -> usize {
        self.chunks
            .values()
            .filter(|e| e.buf.is_some())
            .count()
    }

    pub fn pending_jobs(&self) -> usize {
        self.runtime.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_mesh::build_chunk_batches;
    use cairn_world::GenParams;
    use std::time::{Duration, Instant};

    fn streamer(seed: i32, render_distance: i32) -> ChunkStreamer {
        let world = Arc::new(World::new(seed, GenParams::default()));
        let runtime = Runtime::with_workers(world.clone(), 2);
        ChunkStreamer::new(world, runtime, render_distance)
    }

    fn pump<F: Fn(&ChunkStreamer) -> bool>(s: &mut ChunkStreamer, viewer: Vec3, done: F) {
        let deadline = Instant::now() + Duration::from_secs(30);
        while !done(s) {
            assert!(Instant::now() < deadline, "streamer did not settle in time");
            s.tick(viewer);
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn settled(s: &ChunkStreamer) -> bool {
        s.pending_jobs() == 0
            && s.generating.is_empty()
            && s.remeshing.is_empty()
            && s.dirty.is_empty()
            && s.pending_trees.is_empty()
    }

    #[test]
    fn required_set_is_a_disc() {
        let set = required_set(ChunkCoord::new(0, 0), 2);
        assert!(set.contains(&ChunkCoord::new(0, 0)));
        assert!(set.contains(&ChunkCoord::new(2, 0)));
        assert!(set.contains(&ChunkCoord::new(1, 1)));
        // Corners of the square fail the squared-distance test.
        assert!(!set.contains(&ChunkCoord::new(2, 2)));
        let expect = (-2i32..=2)
            .flat_map(|dx| (-2i32..=2).map(move |dz| (dx, dz)))
            .filter(|(dx, dz)| dx * dx + dz * dz <= 4)
            .count();
        assert_eq!(set.len(), expect);
    }

    #[test]
    fn disc_test_survives_huge_render_distances() {
        // 46341^2 overflows i32; the membership check must not.
        let r = 46_341;
        assert!(within_disc(r, 0, r));
        assert!(within_disc(0, -r, r));
        assert!(!within_disc(r, 1, r));
        assert!(!within_disc(-r, -r, r));
    }

    #[test]
    fn chunks_stream_in_around_the_viewer_and_evict_behind_it() {
        let mut s = streamer(11, 1);
        let home = Vec3::new(8.0, 80.0, 8.0);
        pump(&mut s, home, |s| {
            s.is_chunk_data_ready(ChunkCoord::new(0, 0)) && settled(s)
        });
        assert!(s.loaded_chunks() >= 5);
        assert!(s.visible_batches().any(|(_, b)| !b.is_empty()));

        // Walk far away: the old neighborhood must unload.
        let away = Vec3::new(8.0 + 64.0 * 16.0, 80.0, 8.0);
        pump(&mut s, away, |s| {
            s.is_chunk_data_ready(ChunkCoord::new(64, 0))
                && !s.chunks.contains_key(&ChunkCoord::new(0, 0))
                && settled(s)
        });
        assert_eq!(s.get_block(8, 60, 8), Block::Air);
        assert_eq!(s.highest_solid_y(8, 8), -1);
    }

    #[test]
    fn unloaded_accessors_return_sentinels() {
        let s = streamer(5, 1);
        assert_eq!(s.get_block(0, 10, 0), Block::Air);
        assert_eq!(s.get_block(0, -1, 0), Block::Air);
        assert_eq!(s.get_block(0, 300, 0), Block::Air);
        assert_eq!(s.highest_solid_y(0, 0), -1);
        assert!(!s.is_chunk_data_ready(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn edits_mark_owner_and_boundary_neighbors_dirty() {
        let mut s = streamer(21, 2);
        let home = Vec3::new(8.0, 80.0, 8.0);
        pump(&mut s, home, |s| {
            s.is_chunk_data_ready(ChunkCoord::new(0, 0))
                && s.is_chunk_data_ready(ChunkCoord::new(-1, 0))
                && settled(s)
        });

        // Rewriting the same value is a no-op and dirties nothing.
        let existing = s.get_block(8, 100, 8);
        assert!(!s.set_block(8, 100, 8, existing));
        assert!(s.dirty.is_empty());

        // Interior edit dirties exactly the owning chunk.
        assert!(s.set_block(8, 100, 8, Block::OakPlanks));
        assert_eq!(
            s.dirty.iter().copied().collect::<Vec<_>>(),
            vec![ChunkCoord::new(0, 0)]
        );
        s.dirty.clear();

        // Edit on the x == 0 face also dirties the -x neighbor.
        assert!(s.set_block(0, 100, 8, Block::OakPlanks));
        assert!(s.dirty.contains(&ChunkCoord::new(0, 0)));
        assert!(s.dirty.contains(&ChunkCoord::new(-1, 0)));
        assert_eq!(s.dirty.len(), 2);
    }

    #[test]
    fn remesh_after_edit_matches_a_direct_mesh_of_the_grid() {
        let mut s = streamer(31, 0);
        let home = Vec3::new(8.0, 80.0, 8.0);
        pump(&mut s, home, |s| {
            s.is_chunk_data_ready(ChunkCoord::new(0, 0)) && settled(s)
        });

        let y = s.highest_solid_y(8, 8);
        assert!(s.set_block(8, y + 1, 8, Block::CraftingTable));
        pump(&mut s, home, settled);

        let entry = &s.chunks[&ChunkCoord::new(0, 0)];
        let direct = build_chunk_batches(entry.buf.as_ref().unwrap());
        assert_eq!(entry.batches, direct);
        assert!(
            entry
                .batches
                .iter()
                .any(|b| b.material.block == Block::CraftingTable)
        );
    }

    /// A column in the center chunk whose surface is still plain grass
    /// (no naturally grown tree on top).
    fn grass_column(s: &ChunkStreamer) -> (i32, i32, i32) {
        for x in 0..CHUNK_SIZE_X as i32 {
            for z in 0..CHUNK_SIZE_Z as i32 {
                let y = s.highest_solid_y(x, z);
                if y > 0 && s.get_block(x, y, z) == Block::Grass {
                    return (x, y, z);
                }
            }
        }
        panic!("no grass column in the center chunk");
    }

    #[test]
    fn queued_tree_grows_a_trunk_and_canopy() {
        let mut s = streamer(41, 2);
        let home = Vec3::new(8.0, 80.0, 8.0);
        pump(&mut s, home, |s| {
            s.is_chunk_data_ready(ChunkCoord::new(0, 0)) && settled(s)
        });

        let (x, surface, z) = grass_column(&s);
        s.pending_trees.push_back(TreeAnchor {
            x,
            y: surface + 1,
            z,
        });
        pump(&mut s, home, settled);

        let trunk_h = s.world.params.trees.trunk_height;
        for dy in 0..trunk_h {
            assert_eq!(s.get_block(x, surface + 1 + dy, z), Block::Log);
        }
        assert_eq!(
            s.get_block(x, surface + 1 + trunk_h, z),
            Block::Leaves,
            "cap leaf above the trunk"
        );
        let ring_y = surface + 1 + trunk_h / 2;
        let ring_leaves = (-2i32..=2)
            .flat_map(|dx| (-2i32..=2).map(move |dz| (dx, dz)))
            .filter(|&(dx, dz)| !(dx == 0 && dz == 0))
            .filter(|&(dx, dz)| s.get_block(x + dx, ring_y, z + dz) == Block::Leaves)
            .count();
        assert!(ring_leaves > 0);
    }

    #[test]
    fn tree_on_bad_ground_is_dropped() {
        let mut s = streamer(43, 2);
        let home = Vec3::new(8.0, 80.0, 8.0);
        pump(&mut s, home, |s| {
            s.is_chunk_data_ready(ChunkCoord::new(0, 0)) && settled(s)
        });

        let (x, surface, z) = grass_column(&s);
        s.set_block(x, surface, z, Block::Stone);
        pump(&mut s, home, settled);

        s.pending_trees.push_back(TreeAnchor {
            x,
            y: surface + 1,
            z,
        });
        pump(&mut s, home, settled);
        assert_ne!(s.get_block(x, surface + 1, z), Block::Log);
    }
}
