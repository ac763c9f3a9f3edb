//! Per-vertex ambient occlusion.
//!
//! Local contact-shadow approximation: each face vertex samples up to
//! three neighboring cells (two edge-adjacent plus the diagonal corner,
//! picked by the face normal's axis and which half of the face the vertex
//! sits in) and maps the solid count to a brightness tint. Single-block
//! radius only; there is no light propagation.

use cairn_chunk::ChunkBuf;

/// Brightness by occluder count 0..=3.
const AO_LEVELS: [f32; 4] = [1.0, 0.8, 0.65, 0.5];

#[inline]
fn solid_at(buf: &ChunkBuf, x: i32, y: i32, z: i32) -> bool {
    buf.get_local(x, y, z).is_solid()
}

/// Brightness in `(0, 1]` for a face vertex at chunk-local coordinates
/// `(vx, vy, vz)` with face normal `normal`.
pub fn vertex_brightness(buf: &ChunkBuf, vx: f32, vy: f32, vz: f32, normal: [f32; 3]) -> f32 {
    let xi = vx.floor() as i32;
    let yi = vy.floor() as i32;
    let zi = vz.floor() as i32;

    // Which half of the neighboring cell the vertex sits in, per axis.
    let dx = vx - (xi as f32 + 0.5);
    let dy = vy - (yi as f32 + 0.5);
    let dz = vz - (zi as f32 + 0.5);

    let (mut s1, mut s2, mut corner) = ((xi, yi, zi), (xi, yi, zi), (xi, yi, zi));
    if normal[0].abs() > 0.5 {
        s1.1 += if dy > 0.0 { 1 } else { -1 };
        s2.2 += if dz > 0.0 { 1 } else { -1 };
        corner.1 = s1.1;
        corner.2 = s2.2;
    } else if normal[1].abs() > 0.5 {
        s1.0 += if dx > 0.0 { 1 } else { -1 };
        s2.2 += if dz > 0.0 { 1 } else { -1 };
        corner.0 = s1.0;
        corner.2 = s2.2;
    } else {
        s1.0 += if dx > 0.0 { 1 } else { -1 };
        s2.1 += if dy > 0.0 { 1 } else { -1 };
        corner.0 = s1.0;
        corner.1 = s2.1;
    }

    let side1 = solid_at(buf, s1.0, s1.1, s1.2);
    let side2 = solid_at(buf, s2.0, s2.1, s2.2);
    // The corner only occludes when both edges touching it do; otherwise
    // the open edge already lets light past it.
    let corner_solid = side1 && side2 && solid_at(buf, corner.0, corner.1, corner.2);

    let occlusion = usize::from(side1) + usize::from(side2) + usize::from(corner_solid);
    AO_LEVELS[occlusion]
}
