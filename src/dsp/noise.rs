//! Colored noise sources.
//!
//! White noise is uniform in [-1, 1]. Pink noise uses Paul Kellet's 6-pole
//! refined filter and brown noise a leaky integrator; both coefficient sets
//! are a fixed contract and must not be retuned.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Spectral color of a noise source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseColor {
    White,
    Pink,
    Brown,
}

/// Persistent filter memory for one noise channel.
///
/// Lives as long as the playback session that owns the source; a new
/// session starts from zeroed taps.
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseFilterState {
    White,
    /// Kellet taps `b0..b6`.
    Pink { taps: [f64; 7] },
    /// Last integrator output, before the output scaling.
    Brown { last: f64 },
}

impl NoiseFilterState {
    pub fn new(color: NoiseColor) -> Self {
        match color {
            NoiseColor::White => NoiseFilterState::White,
            NoiseColor::Pink => NoiseFilterState::Pink { taps: [0.0; 7] },
            NoiseColor::Brown => NoiseFilterState::Brown { last: 0.0 },
        }
    }

    /// Feed one white sample through the filter and return the colored sample.
    #[inline]
    pub fn process(&mut self, white: f64) -> f64 {
        match self {
            NoiseFilterState::White => white,
            NoiseFilterState::Pink { taps: b } => {
                b[0] = 0.99886 * b[0] + white * 0.0555179;
                b[1] = 0.99332 * b[1] + white * 0.0750759;
                b[2] = 0.969 * b[2] + white * 0.153852;
                b[3] = 0.8665 * b[3] + white * 0.3104856;
                b[4] = 0.55 * b[4] + white * 0.5329522;
                b[5] = -0.7616 * b[5] - white * 0.016898;
                let out = (b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362) * 0.11;
                b[6] = white * 0.115926;
                out
            }
            NoiseFilterState::Brown { last } => {
                let y = (*last + 0.02 * white) / 1.02;
                *last = y;
                y * 3.5
            }
        }
    }
}

/// One channel of colored noise: a seeded PRNG feeding a filter.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    color: NoiseColor,
    state: NoiseFilterState,
    rng: StdRng,
}

impl NoiseSource {
    /// A source with a fixed seed, for reproducible renders.
    pub fn seeded(color: NoiseColor, seed: u64) -> Self {
        NoiseSource {
            color,
            state: NoiseFilterState::new(color),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A source seeded from the OS entropy pool, for live playback.
    pub fn from_entropy(color: NoiseColor) -> Self {
        Self::seeded(color, rand::random())
    }

    pub fn color(&self) -> NoiseColor {
        self.color
    }

    pub fn state(&self) -> &NoiseFilterState {
        &self.state
    }

    /// Generate the next sample. The filter runs unclamped; only the
    /// emitted value is limited to [-1, 1].
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let white = self.rng.gen_range(-1.0..=1.0);
        self.state.process(white).clamp(-1.0, 1.0)
    }
}

/// Two independent noise channels (decorrelated stereo).
#[derive(Debug, Clone)]
pub struct StereoNoise {
    pub left: NoiseSource,
    pub right: NoiseSource,
}

impl StereoNoise {
    /// Derive both channel seeds from one session seed.
    pub fn seeded(color: NoiseColor, seed: u64) -> Self {
        StereoNoise {
            left: NoiseSource::seeded(color, seed),
            right: NoiseSource::seeded(color, seed.wrapping_add(0x9E37_79B9_7F4A_7C15)),
        }
    }

    pub fn from_entropy(color: NoiseColor) -> Self {
        Self::seeded(color, rand::random())
    }

    #[inline]
    pub fn next_frame(&mut self) -> (f64, f64) {
        (self.left.next_sample(), self.right.next_sample())
    }
}
