//! Block identity, face geometry roles, and material keys.
#![forbid(unsafe_code)]

pub mod material;

pub use material::{FaceSlot, MaterialKey};

/// Block type stored per voxel. The discriminants are the wire values the
/// renderer and any external tooling see, so they are fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Block {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Log = 4,
    Leaves = 5,
    CoalOre = 6,
    IronOre = 7,
    GoldOre = 8,
    RedstoneOre = 9,
    LapisOre = 10,
    DiamondOre = 11,
    EmeraldOre = 12,
    CopperOre = 13,
    CraftingTable = 14,
    OakPlanks = 15,
}

impl Block {
    pub const AIR: Block = Block::Air;

    /// All ore variants, rarest first. Vein placement walks this order so a
    /// single stone voxel can start at most one vein.
    pub const ORES_RAREST_FIRST: [Block; 8] = [
        Block::DiamondOre,
        Block::EmeraldOre,
        Block::LapisOre,
        Block::GoldOre,
        Block::RedstoneOre,
        Block::CopperOre,
        Block::IronOre,
        Block::CoalOre,
    ];

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Decodes a raw byte; unknown values read as air rather than erroring.
    #[inline]
    pub fn from_id(id: u8) -> Block {
        match id {
            1 => Block::Grass,
            2 => Block::Dirt,
            3 => Block::Stone,
            4 => Block::Log,
            5 => Block::Leaves,
            6 => Block::CoalOre,
            7 => Block::IronOre,
            8 => Block::GoldOre,
            9 => Block::RedstoneOre,
            10 => Block::LapisOre,
            11 => Block::DiamondOre,
            12 => Block::EmeraldOre,
            13 => Block::CopperOre,
            14 => Block::CraftingTable,
            15 => Block::OakPlanks,
            _ => Block::Air,
        }
    }

    /// Solid for collision and ambient occlusion. Leaves are walk-through
    /// and do not cast contact shadows.
    #[inline]
    pub fn is_solid(self) -> bool {
        !matches!(self, Block::Air | Block::Leaves)
    }

    /// Transparent for face culling: a face is drawn where transparency
    /// differs across the boundary, or where two transparent blocks of
    /// different types meet (air next to leaves).
    #[inline]
    pub fn is_transparent(self) -> bool {
        matches!(self, Block::Air | Block::Leaves)
    }

    /// Terrain the vein walk may replace. Existing ore and special blocks
    /// are never clobbered by a later vein.
    #[inline]
    pub fn is_vein_overwritable(self) -> bool {
        matches!(self, Block::Stone | Block::Air | Block::Dirt | Block::Grass)
    }

    #[inline]
    pub fn is_ore(self) -> bool {
        Block::ORES_RAREST_FIRST.contains(&self)
    }
}

/// Cube face, ordered to match the vertex/normal tables in the mesher.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosX = 0,
    NegX = 1,
    PosY = 2,
    NegY = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }

    /// Unit normal as plain floats; the mesher writes these verbatim.
    #[inline]
    pub fn normal(self) -> [f32; 3] {
        match self {
            Face::PosX => [1.0, 0.0, 0.0],
            Face::NegX => [-1.0, 0.0, 0.0],
            Face::PosY => [0.0, 1.0, 0.0],
            Face::NegY => [0.0, -1.0, 0.0],
            Face::PosZ => [0.0, 0.0, 1.0],
            Face::NegZ => [0.0, 0.0, -1.0],
        }
    }
}
