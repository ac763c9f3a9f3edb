//! Background job queue and worker orchestration for chunk work.
//!
//! The tick loop submits jobs and drains results; workers run generation
//! and meshing off-thread and never touch controller state. Results for a
//! chunk that has since been evicted are simply dropped by the drainer.
#![forbid(unsafe_code)]

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use cairn_blocks::Block;
use cairn_chunk::{ChunkBuf, TreeAnchor, generate_chunk};
use cairn_mesh::{GeometryBatch, build_chunk_batches};
use cairn_world::{ChunkCoord, World};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Work shipped to a chunk worker. Generate carries the column height
/// samples the controller precomputed; Remesh carries a snapshot of the
/// edited voxels. Workers never read shared chunk state.
#[derive(Clone, Debug)]
pub enum Job {
    Generate {
        coord: ChunkCoord,
        heights: Vec<f32>,
        job_id: u64,
    },
    Remesh {
        coord: ChunkCoord,
        blocks: Vec<Block>,
        job_id: u64,
    },
}

impl Job {
    fn coord(&self) -> ChunkCoord {
        match self {
            Job::Generate { coord, .. } | Job::Remesh { coord, .. } => *coord,
        }
    }

    fn job_id(&self) -> u64 {
        match self {
            Job::Generate { job_id, .. } | Job::Remesh { job_id, .. } => *job_id,
        }
    }

    fn kind(&self) -> JobKind {
        match self {
            Job::Generate { .. } => JobKind::Generate,
            Job::Remesh { .. } => JobKind::Remesh,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Generate,
    Remesh,
}

/// Worker output. `buf` is present only for completed generation; a job
/// that panicked comes back with no payload at all so the controller can
/// clear its bookkeeping.
pub struct JobOut {
    pub coord: ChunkCoord,
    pub job_id: u64,
    pub kind: JobKind,
    pub buf: Option<ChunkBuf>,
    pub batches: Vec<GeometryBatch>,
    pub trees: Vec<TreeAnchor>,
    pub t_total_ms: u32,
}

fn process_job(job: Job, world: &World, tx: &Sender<JobOut>) {
    let t0 = Instant::now();
    match job {
        Job::Generate {
            coord,
            heights,
            job_id,
        } => {
            let generated = generate_chunk(coord, &heights, world.seed, &world.params);
            let batches = build_chunk_batches(&generated.buf);
            let _ = tx.send(JobOut {
                coord,
                job_id,
                kind: JobKind::Generate,
                buf: Some(generated.buf),
                batches,
                trees: generated.trees,
                t_total_ms: elapsed_ms(t0),
            });
        }
        Job::Remesh {
            coord,
            blocks,
            job_id,
        } => {
            let buf = ChunkBuf::from_blocks(coord, blocks);
            let batches = build_chunk_batches(&buf);
            let _ = tx.send(JobOut {
                coord,
                job_id,
                kind: JobKind::Remesh,
                buf: None,
                batches,
                trees: Vec::new(),
                t_total_ms: elapsed_ms(t0),
            });
        }
    }
}

#[inline]
fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

pub struct Runtime {
    job_tx: Sender<Job>,
    res_rx: Receiver<JobOut>,
    _pool: Arc<ThreadPool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl Runtime {
    /// Spawns the worker pool with one thread per core, leaving one core
    /// for the tick loop.
    pub fn new(world: Arc<World>) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1))
            .unwrap_or(1)
            .max(1);
        Self::with_workers(world, workers)
    }

    pub fn with_workers(world: Arc<World>, workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<Job>();
        let (res_tx, res_rx) = unbounded::<JobOut>();
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("cairn-chunk-{i}"))
                .build()
                .expect("chunk worker pool"),
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let world = world.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    queued.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    let coord = job.coord();
                    let job_id = job.job_id();
                    let kind = job.kind();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        process_job(job, world.as_ref(), &tx);
                    }));
                    if outcome.is_err() {
                        log::error!(
                            "chunk job {job_id} ({kind:?}) panicked at ({},{})",
                            coord.cx,
                            coord.cz
                        );
                        let _ = tx.send(JobOut {
                            coord,
                            job_id,
                            kind,
                            buf: None,
                            batches: Vec::new(),
                            trees: Vec::new(),
                            t_total_ms: 0,
                        });
                    }
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }
        Self {
            job_tx,
            res_rx,
            _pool: pool,
            queued,
            inflight,
            workers,
        }
    }

    pub fn submit(&self, job: Job) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Non-blocking drain of every finished job.
    pub fn drain_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// Jobs submitted but not yet finished (queued plus running).
    pub fn pending(&self) -> usize {
        self.queued.load(Ordering::Relaxed) + self.inflight.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_world::GenParams;
    use std::time::Duration;

    fn wait_results(rt: &Runtime, want: usize) -> Vec<JobOut> {
        let deadline = Instant::now() + Duration::from_secs(20);
        let mut out = Vec::new();
        while out.len() < want && Instant::now() < deadline {
            out.extend(rt.drain_results());
            thread::sleep(Duration::from_millis(5));
        }
        out
    }

    fn heights_for(world: &World, coord: ChunkCoord) -> Vec<f32> {
        world.column_heights(&world.height_field(), coord)
    }

    #[test]
    fn generate_job_returns_blocks_and_batches() {
        let world = Arc::new(World::new(7, GenParams::default()));
        let rt = Runtime::with_workers(world.clone(), 2);
        rt.submit(Job::Generate {
            coord: ChunkCoord::new(0, 0),
            heights: heights_for(&world, ChunkCoord::new(0, 0)),
            job_id: 1,
        });
        let results = wait_results(&rt, 1);
        assert_eq!(results.len(), 1);
        let out = &results[0];
        assert_eq!(out.kind, JobKind::Generate);
        assert_eq!(out.coord, ChunkCoord::new(0, 0));
        let buf = out.buf.as_ref().unwrap();
        assert!(buf.has_non_air());
        assert!(!out.batches.is_empty());
        assert_eq!(rt.pending(), 0);
    }

    #[test]
    fn generation_matches_inline_reference() {
        // A worker result must be exactly what the pure generator says.
        let world = Arc::new(World::new(99, GenParams::default()));
        let rt = Runtime::with_workers(world.clone(), 1);
        let coord = ChunkCoord::new(-3, 5);
        let heights = heights_for(&world, coord);
        rt.submit(Job::Generate {
            coord,
            heights: heights.clone(),
            job_id: 1,
        });
        let results = wait_results(&rt, 1);

        let expect = generate_chunk(coord, &heights, world.seed, &world.params);
        assert_eq!(results[0].buf.as_ref().unwrap().blocks, expect.buf.blocks);
        assert_eq!(results[0].trees, expect.trees);
    }

    #[test]
    fn remesh_job_reflects_the_snapshot() {
        let world = Arc::new(World::new(7, GenParams::default()));
        let rt = Runtime::with_workers(world, 1);
        let coord = ChunkCoord::new(4, 4);
        let mut buf = ChunkBuf::new_air(coord);
        buf.set_local(8, 100, 8, Block::Stone);
        rt.submit(Job::Remesh {
            coord,
            blocks: buf.blocks.clone(),
            job_id: 9,
        });
        let results = wait_results(&rt, 1);
        assert_eq!(results[0].kind, JobKind::Remesh);
        assert_eq!(results[0].job_id, 9);
        assert!(results[0].buf.is_none());
        assert_eq!(results[0].batches, build_chunk_batches(&buf));
    }

    #[test]
    fn panicked_job_still_replies_with_null_payload() {
        // Undersized height slice makes the generator index out of
        // bounds; the worker must still answer so the controller's
        // generating set clears.
        let world = Arc::new(World::new(7, GenParams::default()));
        let rt = Runtime::with_workers(world, 1);
        let coord = ChunkCoord::new(2, -2);
        rt.submit(Job::Generate {
            coord,
            heights: vec![60.0; 4],
            job_id: 13,
        });
        let results = wait_results(&rt, 1);
        assert_eq!(results.len(), 1);
        let out = &results[0];
        assert_eq!(out.coord, coord);
        assert_eq!(out.job_id, 13);
        assert_eq!(out.kind, JobKind::Generate);
        assert!(out.buf.is_none());
        assert!(out.batches.is_empty());
        assert!(out.trees.is_empty());

        let deadline = Instant::now() + Duration::from_secs(20);
        while rt.pending() != 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(rt.pending(), 0);
    }

    #[test]
    fn many_jobs_all_come_back() {
        let world = Arc::new(World::new(1, GenParams::default()));
        let rt = Runtime::with_workers(world.clone(), 3);
        for i in 0..9 {
            let coord = ChunkCoord::new(i % 3, i / 3);
            rt.submit(Job::Generate {
                coord,
                heights: heights_for(&world, coord),
                job_id: i as u64,
            });
        }
        let results = wait_results(&rt, 9);
        assert_eq!(results.len(), 9);
        let mut ids: Vec<u64> = results.iter().map(|r| r.job_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..9).collect::<Vec<u64>>());
    }
}
