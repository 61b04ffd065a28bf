//! Seeded multi-octave value noise.

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

const TABLE_LEN: usize = 256;
const TABLE_SHUFFLE_SEED: u64 = 0x5eed_7ab1_e000_0256;

/// Deterministic 2D coherent-noise function.
///
/// Lattice values come from a fixed 256-entry permutation indexed by
/// `(coordinate + seed) mod 256`, applied once per axis. Between lattice
/// points the value is interpolated bilinearly with smoothstep easing, and
/// successive octaves halve the amplitude while doubling the frequency. The
/// output always lies in `[0, 1)`.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    seed: u32,
    table: [u8; TABLE_LEN],
}

impl NoiseGenerator {
    /// Creates a generator for the provided seed.
    #[must_use]
    pub fn new(seed: u32) -> Self {
        let mut table = [0_u8; TABLE_LEN];
        for (index, slot) in table.iter_mut().enumerate() {
            *slot = index as u8;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(TABLE_SHUFFLE_SEED);
        table.shuffle(&mut rng);
        Self { seed, table }
    }

    /// Seed the generator was created with.
    #[must_use]
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples `octaves` layers of noise at `(x, y)` scaled by `frequency`.
    ///
    /// Zero octaves yield `0.0`.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64, frequency: f64, octaves: u32) -> f64 {
        if octaves == 0 {
            return 0.0;
        }

        let mut xa = x * frequency;
        let mut ya = y * frequency;
        let mut amplitude = 1.0;
        let mut total = 0.0;
        let mut weight = 0.0;

        for _ in 0..octaves {
            total += self.smooth_noise(xa, ya) * amplitude;
            weight += amplitude;
            amplitude *= 0.5;
            xa *= 2.0;
            ya *= 2.0;
        }

        total / weight
    }

    fn smooth_noise(&self, x: f64, y: f64) -> f64 {
        let x_floor = x.floor();
        let y_floor = y.floor();
        let x_frac = x - x_floor;
        let y_frac = y - y_floor;
        let xi = x_floor as i64;
        let yi = y_floor as i64;

        let top_left = self.lattice(xi, yi);
        let top_right = self.lattice(xi.wrapping_add(1), yi);
        let bottom_left = self.lattice(xi, yi.wrapping_add(1));
        let bottom_right = self.lattice(xi.wrapping_add(1), yi.wrapping_add(1));

        let top = smooth_lerp(top_left, top_right, x_frac);
        let bottom = smooth_lerp(bottom_left, bottom_right, x_frac);
        smooth_lerp(top, bottom, y_frac)
    }

    fn lattice(&self, x: i64, y: i64) -> f64 {
        let row = self.table[wrap(y.wrapping_add(i64::from(self.seed)))];
        let value = self.table[wrap(i64::from(row).wrapping_add(x))];
        f64::from(value) / TABLE_LEN as f64
    }
}

fn wrap(value: i64) -> usize {
    value.rem_euclid(TABLE_LEN as i64) as usize
}

fn smooth_lerp(from: f64, to: f64, t: f64) -> f64 {
    let eased = t * t * (3.0 - 2.0 * t);
    from + eased * (to - from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_a_permutation() {
        let generator = NoiseGenerator::new(0);
        let mut seen = [false; TABLE_LEN];
        for value in generator.table {
            seen[usize::from(value)] = true;
        }
        assert!(seen.iter().all(|present| *present));
    }

    #[test]
    fn samples_are_repeatable() {
        let first = NoiseGenerator::new(7);
        let second = NoiseGenerator::new(7);
        for (x, y) in [(0.0, 0.0), (3.5, -2.25), (-100.0, 40.0), (12345.0, 999.0)] {
            assert_eq!(first.sample(x, y, 0.1, 4), second.sample(x, y, 0.1, 4));
        }
    }

    #[test]
    fn samples_stay_in_unit_interval() {
        let generator = NoiseGenerator::new(3);
        for y in -40..40 {
            for x in -40..40 {
                let value = generator.sample(f64::from(x), f64::from(y), 0.13, 5);
                assert!((0.0..1.0).contains(&value), "sample {value} out of range");
            }
        }
    }

    #[test]
    fn lattice_points_match_table_lookup() {
        let generator = NoiseGenerator::new(11);
        let value = generator.sample(4.0, 9.0, 1.0, 1);
        let row = generator.table[(9 + 11) % TABLE_LEN];
        let expected = generator.table[(usize::from(row) + 4) % TABLE_LEN];
        assert_eq!(value, f64::from(expected) / 256.0);
    }

    #[test]
    fn zero_octaves_sample_to_zero() {
        assert_eq!(NoiseGenerator::new(1).sample(2.0, 2.0, 0.5, 0), 0.0);
    }

    #[test]
    fn different_seeds_produce_different_fields() {
        let first = NoiseGenerator::new(0);
        let second = NoiseGenerator::new(1);
        let differs = (0..64).any(|x| {
            let x = f64::from(x);
            first.sample(x, 0.0, 0.1, 4) != second.sample(x, 0.0, 0.1, 4)
        });
        assert!(differs);
    }
}
