//! Noise-driven terrain classification.

use serde::{Deserialize, Serialize};
use tile_explorer_core::{CellMeta, TileCoord};

use crate::noise::NoiseGenerator;

/// Displacement applied to the hazard layer so it samples an unrelated region
/// of the noise field.
const HAZARD_LAYER_OFFSET: f64 = 4099.5;

/// Largest value the classifier accepts from the noise generator.
const UNIT_CEILING: f64 = 1.0 - f64::EPSILON;

/// Frequencies and cut-offs used to turn noise samples into terrain.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Frequency of the layer that decides between rock and open ground.
    pub terrain_frequency: f64,
    /// Octave count of the rock layer.
    pub terrain_octaves: u32,
    /// Samples of the rock layer below this value become impassable.
    pub impassable_below: f64,
    /// Frequency of the independent hazard layer.
    pub hazard_frequency: f64,
    /// Octave count of the hazard layer.
    pub hazard_octaves: u32,
    /// Samples of the hazard layer below this value become hazards.
    pub hazard_below: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            terrain_frequency: 0.1,
            terrain_octaves: 4,
            impassable_below: 0.32,
            hazard_frequency: 0.23,
            hazard_octaves: 2,
            hazard_below: 0.22,
        }
    }
}

/// Pure function from tile coordinates to terrain metadata.
#[derive(Clone, Debug)]
pub struct TerrainClassifier {
    noise: NoiseGenerator,
    config: ClassifierConfig,
}

impl TerrainClassifier {
    /// Creates a classifier using the provided seed and thresholds.
    #[must_use]
    pub fn new(seed: u32, config: ClassifierConfig) -> Self {
        Self {
            noise: NoiseGenerator::new(seed),
            config,
        }
    }

    /// Creates a classifier with the default thresholds.
    #[must_use]
    pub fn with_seed(seed: u32) -> Self {
        Self::new(seed, ClassifierConfig::default())
    }

    /// Thresholds applied by the classifier.
    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Seed of the underlying noise field.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.noise.seed()
    }

    /// Classifies a single tile.
    ///
    /// A low rock-layer sample yields impassable terrain; otherwise a low
    /// hazard-layer sample yields a hazard, and anything else is open ground.
    #[must_use]
    pub fn classify(&self, coord: TileCoord) -> CellMeta {
        let x = f64::from(coord.x());
        let y = f64::from(coord.y());

        let rock = clamp_sample(self.noise.sample(
            x,
            y,
            self.config.terrain_frequency,
            self.config.terrain_octaves,
        ));
        if rock < self.config.impassable_below {
            return CellMeta::impassable();
        }

        let hazard = clamp_sample(self.noise.sample(
            x + HAZARD_LAYER_OFFSET,
            y + HAZARD_LAYER_OFFSET,
            self.config.hazard_frequency,
            self.config.hazard_octaves,
        ));
        if hazard < self.config.hazard_below {
            CellMeta::hazard()
        } else {
            CellMeta::normal()
        }
    }
}

fn clamp_sample(value: f64) -> f64 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, UNIT_CEILING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_explorer_core::TerrainKind;

    #[test]
    fn classification_is_deterministic_across_instances() {
        let first = TerrainClassifier::with_seed(0);
        let second = TerrainClassifier::with_seed(0);
        for y in -20..20 {
            for x in -20..20 {
                let coord = TileCoord::new(x, y);
                assert_eq!(first.classify(coord), second.classify(coord));
            }
        }
    }

    #[test]
    fn default_thresholds_produce_every_category() {
        let classifier = TerrainClassifier::with_seed(0);
        let mut kinds = Vec::new();
        for y in 0..100 {
            for x in 0..100 {
                let kind = classifier.classify(TileCoord::new(x, y)).terrain;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        assert!(kinds.contains(&TerrainKind::Normal));
        assert!(kinds.contains(&TerrainKind::Impassable));
        assert!(kinds.contains(&TerrainKind::Hazard));
    }

    #[test]
    fn thresholds_at_extremes_force_a_category() {
        let walls = TerrainClassifier::new(
            5,
            ClassifierConfig {
                impassable_below: 1.0,
                ..ClassifierConfig::default()
            },
        );
        let open = TerrainClassifier::new(
            5,
            ClassifierConfig {
                impassable_below: 0.0,
                hazard_below: 0.0,
                ..ClassifierConfig::default()
            },
        );
        for x in 0..30 {
            let coord = TileCoord::new(x, -x);
            assert_eq!(walls.classify(coord), CellMeta::impassable());
            assert_eq!(open.classify(coord), CellMeta::normal());
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        assert_eq!(clamp_sample(f64::NAN), 0.5);
        assert_eq!(clamp_sample(-3.0), 0.0);
        assert!(clamp_sample(7.0) < 1.0);
    }
}
