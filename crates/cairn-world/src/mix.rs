//! Deterministic coordinate hashing.
//!
//! Generation never draws from a stateful RNG: every decision (vein
//! attempt, vein walk, tree placement) hashes its world coordinates, the
//! world seed, and a salt naming the use-case. Identical inputs therefore
//! reproduce identical worlds regardless of which thread or in what order
//! chunks are generated. The mix keeps 32-bit wrapping semantics so seeds
//! stay portable.

/// Salt for the per-voxel vein attempt draw.
pub const SALT_VEIN_ATTEMPT: &str = "vein_attempt";
/// Salt prefix for a vein's size/direction stream; the ore id is appended.
pub const SALT_VEIN_PREFIX: &str = "vein_";
/// Salt for the per-column tree placement draw.
pub const SALT_TREE: &str = "tree_placement";

/// Hashes integer coordinates with a seed and salt into a 32-bit state.
///
/// Salt bytes are folded into the seed first (`seed*31 + byte`), then the
/// coordinates are combined with distinct prime weights, masked to 31 bits,
/// and finished with two multiply-xor-shift rounds.
#[inline]
pub fn hash_coords(x: i32, y: i32, z: i32, world_seed: i32, salt: &str) -> u32 {
    let mut seed = world_seed;
    for b in salt.bytes() {
        seed = seed.wrapping_mul(31).wrapping_add(i32::from(b));
    }
    let combined = x
        .wrapping_mul(31)
        .wrapping_add(y.wrapping_mul(19))
        .wrapping_add(z.wrapping_mul(17))
        .wrapping_add(seed.wrapping_mul(41))
        & 0x7fff_ffff;
    let mut h = combined as u32;
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

/// Scrambles a hash state into a uniform draw in `[0, 1)`.
///
/// Callers derive fresh draws by offsetting the state (`state + i`), which
/// keeps a vein's whole walk reproducible from its start voxel.
#[inline]
pub fn unit_f64(state: u32) -> f64 {
    let s = state.wrapping_add(0x6D2B_79F5);
    let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
    t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
    f64::from(t ^ (t >> 14)) / 4_294_967_296.0
}
