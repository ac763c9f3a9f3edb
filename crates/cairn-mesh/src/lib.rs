//! CPU mesher: face culling and per-vertex ambient occlusion.
#![forbid(unsafe_code)]

pub mod ao;
pub mod tables;

use std::collections::HashMap;

use cairn_blocks::{Block, Face, MaterialKey};
use cairn_chunk::ChunkBuf;
use cairn_world::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};

pub use ao::vertex_brightness;

/// One material's worth of triangle geometry for a chunk, in chunk-local
/// coordinates. Parallel arrays, 3/3/2/3 floats per vertex. Immutable once
/// built; a remesh fully replaces a chunk's batches.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryBatch {
    pub material: MaterialKey,
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    pub colors: Vec<f32>,
}

impl GeometryBatch {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Growable per-material accumulation buffer.
#[derive(Default)]
struct MeshBuild {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    colors: Vec<f32>,
}

impl MeshBuild {
    fn push_vertex(&mut self, pos: [f32; 3], normal: [f32; 3], uv: [f32; 2], brightness: f32) {
        self.positions.extend_from_slice(&pos);
        self.normals.extend_from_slice(&normal);
        self.uvs.extend_from_slice(&uv);
        self.colors.extend_from_slice(&[brightness, brightness, brightness]);
    }

    fn into_batch(self, material: MaterialKey) -> GeometryBatch {
        GeometryBatch {
            material,
            positions: self.positions,
            normals: self.normals,
            uvs: self.uvs,
            colors: self.colors,
        }
    }
}

/// A face is drawn where transparency differs across the boundary, or
/// where two transparent blocks of different types meet (leaves against
/// air from either side). Solid against solid never draws.
#[inline]
fn face_visible(current: Block, neighbor: Block) -> bool {
    let ct = current.is_transparent();
    let nt = neighbor.is_transparent();
    (nt != ct) || (nt && ct && neighbor != current)
}

/// Converts a chunk's voxels into per-material geometry batches.
///
/// Neighbor lookups stay inside the grid; out-of-grid cells read as air,
/// so faces on a chunk boundary are always emitted. Batches come out
/// sorted by material key so identical grids always mesh identically.
pub fn build_chunk_batches(buf: &ChunkBuf) -> Vec<GeometryBatch> {
    let mut builds: HashMap<MaterialKey, MeshBuild> = HashMap::new();

    for y in 0..CHUNK_SIZE_Y as i32 {
        for z in 0..CHUNK_SIZE_Z as i32 {
            for x in 0..CHUNK_SIZE_X as i32 {
                let block = buf.get_local(x, y, z);
                if block == Block::Air {
                    continue;
                }
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    let neighbor = buf.get_local(x + dx, y + dy, z + dz);
                    if !face_visible(block, neighbor) {
                        continue;
                    }
                    emit_face(&mut builds, buf, block, face, x, y, z);
                }
            }
        }
    }

    let mut batches: Vec<GeometryBatch> = builds
        .into_iter()
        .map(|(key, build)| build.into_batch(key))
        .collect();
    batches.sort_by_key(|b| b.material);
    if !batches.is_empty() {
        log::trace!(
            "meshed chunk ({},{}) into {} batches",
            buf.coord.cx,
            buf.coord.cz,
            batches.len()
        );
    }
    batches
}

fn emit_face(
    builds: &mut HashMap<MaterialKey, MeshBuild>,
    buf: &ChunkBuf,
    block: Block,
    face: Face,
    x: i32,
    y: i32,
    z: i32,
) {
    let key = MaterialKey::for_face(block, face);
    let normal = face.normal();
    let rotated = block == Block::Log && matches!(face, Face::PosY | Face::NegY);
    let uvs = if rotated {
        &tables::ROTATED_UVS
    } else {
        &tables::STANDARD_UVS
    };
    let build = builds.entry(key).or_default();
    for (offset, uv) in tables::FACE_VERTICES[face.index()].iter().zip(uvs.iter()) {
        let vx = x as f32 + offset[0];
        let vy = y as f32 + offset[1];
        let vz = z as f32 + offset[2];
        let brightness = ao::vertex_brightness(buf, vx, vy, vz, normal);
        build.push_vertex([vx, vy, vz], normal, *uv, brightness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_blocks::FaceSlot;
    use cairn_world::ChunkCoord;

    fn empty() -> ChunkBuf {
        ChunkBuf::new_air(ChunkCoord::new(0, 0))
    }

    fn total_vertices(batches: &[GeometryBatch]) -> usize {
        batches.iter().map(|b| b.vertex_count()).sum()
    }

    #[test]
    fn isolated_voxel_emits_six_faces() {
        let mut buf = empty();
        buf.set_local(8, 100, 8, Block::Stone);
        let batches = build_chunk_batches(&buf);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].material, MaterialKey::new(Block::Stone, FaceSlot::All));
        assert_eq!(batches[0].vertex_count(), 36);
        assert_eq!(batches[0].uvs.len(), 36 * 2);
        assert_eq!(batches[0].colors.len(), 36 * 3);
    }

    #[test]
    fn buried_voxels_emit_nothing_inside() {
        // 4x4x4 solid stone cube: only surface faces appear, no internal
        // face between any pair of solid cells.
        let mut buf = empty();
        for y in 4..8 {
            for z in 4..8 {
                for x in 4..8 {
                    buf.set_local(x, y, z, Block::Stone);
                }
            }
        }
        let batches = build_chunk_batches(&buf);
        // 6 sides * 4x4 cells * 6 vertices.
        assert_eq!(total_vertices(&batches), 6 * 16 * 6);
    }

    #[test]
    fn adjacent_voxels_share_no_face() {
        let mut buf = empty();
        buf.set_local(5, 50, 5, Block::Stone);
        buf.set_local(6, 50, 5, Block::Stone);
        let batches = build_chunk_batches(&buf);
        // 10 exposed faces out of 12.
        assert_eq!(total_vertices(&batches), 10 * 6);
    }

    #[test]
    fn leaves_against_air_draw_both_sides_but_not_each_other() {
        let mut buf = empty();
        buf.set_local(3, 30, 3, Block::Leaves);
        buf.set_local(4, 30, 3, Block::Leaves);
        let batches = build_chunk_batches(&buf);
        // Each leaf block draws its 5 air-facing faces; the shared
        // leaves-to-leaves boundary stays closed.
        assert_eq!(total_vertices(&batches), 10 * 6);

        let mut solid = empty();
        solid.set_local(3, 30, 3, Block::Leaves);
        solid.set_local(4, 30, 3, Block::Stone);
        let batches = build_chunk_batches(&solid);
        // Leaves draw all 6 (incl. against stone), stone draws 6 as well
        // because leaves count as transparent.
        assert_eq!(total_vertices(&batches), 12 * 6);
    }

    #[test]
    fn chunk_boundary_faces_are_drawn() {
        let mut buf = empty();
        buf.set_local(0, 0, 0, Block::Stone);
        let batches = build_chunk_batches(&buf);
        // Corner voxel: all six faces drawn, three of them facing out of
        // the grid.
        assert_eq!(total_vertices(&batches), 36);
    }

    #[test]
    fn grass_splits_into_three_batches() {
        let mut buf = empty();
        buf.set_local(8, 64, 8, Block::Grass);
        let keys: Vec<MaterialKey> =
            build_chunk_batches(&buf).iter().map(|b| b.material).collect();
        // Batches come out sorted by key: slot order is Top, Bottom, Side.
        assert_eq!(
            keys,
            vec![
                MaterialKey::new(Block::Grass, FaceSlot::Top),
                MaterialKey::new(Block::Grass, FaceSlot::Bottom),
                MaterialKey::new(Block::Grass, FaceSlot::Side),
            ]
        );
    }

    #[test]
    fn log_end_faces_use_rotated_uvs() {
        let mut buf = empty();
        buf.set_local(1, 10, 1, Block::Log);
        let batches = build_chunk_batches(&buf);
        let top = batches
            .iter()
            .find(|b| b.material == MaterialKey::new(Block::Log, FaceSlot::Top))
            .expect("log end batch");
        // Top + bottom faces share the end-grain batch: 12 vertices, with
        // the rotated UV pattern leading.
        assert_eq!(top.vertex_count(), 12);
        assert_eq!(&top.uvs[0..4], &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn meshing_twice_is_identical() {
        let mut buf = empty();
        for x in 0..16 {
            for z in 0..16 {
                buf.set_local(x, 40, z, Block::Stone);
                buf.set_local(x, 41, z, Block::Grass);
            }
        }
        let a = build_chunk_batches(&buf);
        let b = build_chunk_batches(&buf);
        assert_eq!(a, b);
    }

    #[test]
    fn floor_corner_vertices_are_darkened_by_walls() {
        // A floor tile with two wall blocks meeting at one corner above
        // it: the corner vertex of the floor's top face reads darker than
        // a fully open vertex.
        let mut buf = empty();
        buf.set_local(8, 9, 8, Block::Stone); // floor
        buf.set_local(7, 10, 8, Block::Stone); // wall
        buf.set_local(8, 10, 7, Block::Stone); // wall
        buf.set_local(7, 10, 7, Block::Stone); // corner
        let batches = build_chunk_batches(&buf);
        let floor_top: Vec<f32> = batches
            .iter()
            .flat_map(|b| b.colors.chunks(3).map(|c| c[0]).collect::<Vec<_>>())
            .collect();
        let min = floor_top.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = floor_top.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(min, 0.5);
        assert_eq!(max, 1.0);
    }
}
