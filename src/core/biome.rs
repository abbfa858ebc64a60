use serde::{Deserialize, Serialize};

use crate::constants::*;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    Beach,
    #[default]
    Plains,
    Forest,
    Mountain,
    Tundra,
}

impl Biome {
    /// Classify a tile from its normalized height and moisture.
    ///
    /// Thresholds are the fixed constants in [`crate::constants`]; the result
    /// depends on nothing but the two inputs.
    pub fn classify(height: f32, moisture: f32) -> Biome {
        if height < SEA_LEVEL {
            Biome::Ocean
        } else if height < BEACH_LEVEL {
            Biome::Beach
        } else if height >= MOUNTAIN_LEVEL {
            if moisture >= TUNDRA_MOISTURE {
                Biome::Tundra
            } else {
                Biome::Mountain
            }
        } else if moisture >= FOREST_MOISTURE {
            Biome::Forest
        } else {
            Biome::Plains
        }
    }

    /// Single character used by the headless map dump.
    pub fn glyph(&self) -> char {
        match self {
            Biome::Ocean => '~',
            Biome::Beach => '.',
            Biome::Plains => '"',
            Biome::Forest => 'T',
            Biome::Mountain => '^',
            Biome::Tundra => '*',
        }
    }
}
