//! Material keys grouping mesh faces that share an appearance.
//!
//! The renderer owns textures; the mesher only tags geometry with a
//! `MaterialKey` and the renderer resolves it (with its own fallback rules)
//! to a concrete texture. Most blocks use a single all-faces slot; grass,
//! logs and crafting tables split by face.

use std::fmt;

use crate::{Block, Face};

/// Which of a block's texture slots a face maps to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum FaceSlot {
    All,
    Top,
    Bottom,
    Side,
    Front,
}

impl FaceSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            FaceSlot::All => "all",
            FaceSlot::Top => "top",
            FaceSlot::Bottom => "bottom",
            FaceSlot::Side => "side",
            FaceSlot::Front => "front",
        }
    }
}

/// Identifier for one batch of faces sharing a texture.
///
/// Renders as `"{block_id}-{slot}"`, the string contract the consuming
/// renderer matches on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MaterialKey {
    pub block: Block,
    pub slot: FaceSlot,
}

impl MaterialKey {
    pub const fn new(block: Block, slot: FaceSlot) -> Self {
        Self { block, slot }
    }

    /// Conspicuous stand-in for anything that cannot be resolved; rendering
    /// one wrong-looking chunk beats halting the tick loop.
    pub const PLACEHOLDER: MaterialKey = MaterialKey::new(Block::Stone, FaceSlot::All);

    /// Resolves the slot a face of `block` belongs to.
    pub fn for_face(block: Block, face: Face) -> MaterialKey {
        let slot = match block {
            Block::Grass => match face {
                Face::PosY => FaceSlot::Top,
                Face::NegY => FaceSlot::Bottom,
                _ => FaceSlot::Side,
            },
            Block::Log => match face {
                // Top and bottom share the end-grain texture.
                Face::PosY | Face::NegY => FaceSlot::Top,
                _ => FaceSlot::Side,
            },
            Block::CraftingTable => match face {
                Face::PosY => FaceSlot::Top,
                Face::NegY => FaceSlot::Bottom,
                Face::PosZ => FaceSlot::Front,
                _ => FaceSlot::Side,
            },
            Block::Air => return MaterialKey::PLACEHOLDER,
            _ => FaceSlot::All,
        };
        MaterialKey::new(block, slot)
    }
}

impl fmt::Display for MaterialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.block.id(), self.slot.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grass_splits_by_face() {
        assert_eq!(
            MaterialKey::for_face(Block::Grass, Face::PosY),
            MaterialKey::new(Block::Grass, FaceSlot::Top)
        );
        assert_eq!(
            MaterialKey::for_face(Block::Grass, Face::NegY),
            MaterialKey::new(Block::Grass, FaceSlot::Bottom)
        );
        assert_eq!(
            MaterialKey::for_face(Block::Grass, Face::PosX),
            MaterialKey::new(Block::Grass, FaceSlot::Side)
        );
    }

    #[test]
    fn log_ends_share_a_slot() {
        let top = MaterialKey::for_face(Block::Log, Face::PosY);
        let bottom = MaterialKey::for_face(Block::Log, Face::NegY);
        assert_eq!(top, bottom);
        assert_eq!(top.slot, FaceSlot::Top);
    }

    #[test]
    fn crafting_table_has_a_front() {
        assert_eq!(
            MaterialKey::for_face(Block::CraftingTable, Face::PosZ).slot,
            FaceSlot::Front
        );
        assert_eq!(
            MaterialKey::for_face(Block::CraftingTable, Face::NegZ).slot,
            FaceSlot::Side
        );
    }

    #[test]
    fn ores_use_one_slot_and_render_as_id_all() {
        let key = MaterialKey::for_face(Block::DiamondOre, Face::NegX);
        assert_eq!(key.slot, FaceSlot::All);
        assert_eq!(key.to_string(), "11-all");
    }
}
