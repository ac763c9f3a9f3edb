//! Generation parameters, loadable from TOML with reference defaults.

use serde::Deserialize;
use std::error::Error;
use std::fs;
use std::path::Path;

use cairn_blocks::Block;

#[derive(Clone, Debug, Deserialize)]
pub struct GenParams {
    #[serde(default)]
    pub noise: NoiseParams,
    #[serde(default)]
    pub veins: VeinParams,
    #[serde(default = "default_ores")]
    pub ores: Vec<OreParams>,
    #[serde(default)]
    pub trees: TreeParams,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            noise: NoiseParams::default(),
            veins: VeinParams::default(),
            ores: default_ores(),
            trees: TreeParams::default(),
        }
    }
}

impl GenParams {
    /// Loads parameters from a TOML file; missing fields take defaults.
    pub fn load_from_path(path: &Path) -> Result<GenParams, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        let params: GenParams = toml::from_str(&text)?;
        Ok(params)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NoiseParams {
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_persistence")]
    pub persistence: f32,
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    #[serde(default = "default_height_scale")]
    pub height_scale: f32,
    #[serde(default = "default_ground_offset")]
    pub ground_offset: f32,
}

fn default_scale() -> f32 {
    100.0
}
fn default_octaves() -> u32 {
    4
}
fn default_persistence() -> f32 {
    0.45
}
fn default_lacunarity() -> f32 {
    2.0
}
fn default_height_scale() -> f32 {
    10.0
}
fn default_ground_offset() -> f32 {
    50.0
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            octaves: default_octaves(),
            persistence: default_persistence(),
            lacunarity: default_lacunarity(),
            height_scale: default_height_scale(),
            ground_offset: default_ground_offset(),
        }
    }
}

/// Vein walk bounds shared by every ore type.
#[derive(Clone, Debug, Deserialize)]
pub struct VeinParams {
    #[serde(default = "default_attempt_chance")]
    pub attempt_chance: f64,
    #[serde(default = "default_min_size")]
    pub min_size: u32,
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_attempt_chance() -> f64 {
    0.015
}
fn default_min_size() -> u32 {
    1
}
fn default_max_size() -> u32 {
    8
}
fn default_iterations() -> u32 {
    12
}

impl Default for VeinParams {
    fn default() -> Self {
        Self {
            attempt_chance: default_attempt_chance(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            iterations: default_iterations(),
        }
    }
}

/// Per-ore spawn band. `chance_scale` multiplies the global attempt chance;
/// the Y weight ramps linearly up to `peak_y` and back down to `max_y`.
#[derive(Clone, Debug, Deserialize)]
pub struct OreParams {
    pub block: Block,
    pub min_y: i32,
    pub max_y: i32,
    pub peak_y: i32,
    pub chance_scale: f64,
}

impl OreParams {
    /// Triangular distribution over `[min_y, max_y]` peaking at `peak_y`;
    /// zero outside the band, 1.0 when the band is degenerate.
    pub fn y_weight(&self, y: i32) -> f64 {
        if y < self.min_y || y > self.max_y {
            return 0.0;
        }
        if self.min_y >= self.max_y {
            return 1.0;
        }
        let peak = self.peak_y.clamp(self.min_y, self.max_y);
        if y <= peak {
            let range_below = peak - self.min_y;
            if range_below > 0 {
                f64::from(y - self.min_y) / f64::from(range_below)
            } else {
                1.0
            }
        } else {
            let range_above = self.max_y - peak;
            if range_above > 0 {
                1.0 - f64::from(y - peak) / f64::from(range_above)
            } else {
                1.0
            }
        }
    }
}

/// Reference ore table, rarest first. Order matters: a stone voxel starts
/// a vein for the first ore whose probability its draw clears.
fn default_ores() -> Vec<OreParams> {
    vec![
        OreParams {
            block: Block::DiamondOre,
            min_y: 0,
            max_y: 80,
            peak_y: 69,
            chance_scale: 0.06,
        },
        OreParams {
            block: Block::EmeraldOre,
            min_y: 48,
            max_y: 255,
            peak_y: 236,
            chance_scale: 0.05,
        },
        OreParams {
            block: Block::LapisOre,
            min_y: 0,
            max_y: 128,
            peak_y: 64,
            chance_scale: 0.08,
        },
        OreParams {
            block: Block::GoldOre,
            min_y: 0,
            max_y: 96,
            peak_y: 48,
            chance_scale: 0.15,
        },
        OreParams {
            block: Block::RedstoneOre,
            min_y: 0,
            max_y: 80,
            peak_y: 5,
            chance_scale: 0.25,
        },
        OreParams {
            block: Block::CopperOre,
            min_y: 48,
            max_y: 176,
            peak_y: 112,
            chance_scale: 0.50,
        },
        OreParams {
            block: Block::IronOre,
            min_y: 0,
            max_y: 255,
            peak_y: 80,
            chance_scale: 0.60,
        },
        OreParams {
            block: Block::CoalOre,
            min_y: 0,
            max_y: 255,
            peak_y: 160,
            chance_scale: 0.75,
        },
    ]
}

#[derive(Clone, Debug, Deserialize)]
pub struct TreeParams {
    #[serde(default = "default_tree_probability")]
    pub probability: f64,
    /// Clearance a candidate column needs above the surface.
    #[serde(default = "default_tree_min_height")]
    pub min_height: i32,
    #[serde(default = "default_trunk_height")]
    pub trunk_height: i32,
}

fn default_tree_probability() -> f64 {
    0.008
}
fn default_tree_min_height() -> i32 {
    7
}
fn default_trunk_height() -> i32 {
    6
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            probability: default_tree_probability(),
            min_height: default_tree_min_height(),
            trunk_height: default_trunk_height(),
        }
    }
}
