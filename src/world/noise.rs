//! Seeded gradient noise over continuous 2D coordinates.
//!
//! Wraps a FastNoiseLite Perlin generator. The lattice hash is derived from the
//! 64-bit world seed once at construction, so sampling is a pure function of
//! `(seed, x, y)` and needs only `&self`.

use fastnoise_lite::{FastNoiseLite, NoiseType};

/// Deterministic scalar noise in `[-1, 1]`.
pub struct NoiseField {
    noise: FastNoiseLite,
    seed: u64,
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut noise = FastNoiseLite::with_seed(fold_seed(seed));
        noise.set_noise_type(Some(NoiseType::Perlin));
        // Callers scale coordinates themselves, one frequency per octave.
        noise.set_frequency(Some(1.0));
        NoiseField { noise, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn sample(&self, x: f32, y: f32) -> f32 {
        self.noise.get_noise_2d(x, y).clamp(-1.0, 1.0)
    }

    /// Fractal sum of `octaves` layers, normalized back into `[-1, 1]`.
    pub fn fractal(
        &self,
        x: f64,
        y: f64,
        octaves: u32,
        base_frequency: f64,
        lacunarity: f64,
        gain: f64,
    ) -> f32 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = base_frequency;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.sample((x * frequency) as f32, (y * frequency) as f32) as f64 * amplitude;
            max_value += amplitude;
            amplitude *= gain;
            frequency *= lacunarity;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        (total / max_value) as f32
    }
}

/// Mix all 64 seed bits into the 32-bit seed FastNoiseLite accepts.
fn fold_seed(seed: u64) -> i32 {
    // splitmix64 finalizer
    let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^= z >> 31;
    ((z >> 32) as u32 ^ z as u32) as i32
}
