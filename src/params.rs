//! Tone parameters: the single value hosts hand to the engine.
//!
//! Hosts decode their own formats (query strings, saved favorites) into
//! `ToneParameters`; the engine validates and clamps on ingestion.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dsp::binaural::check_beat;
use crate::dsp::noise::NoiseColor;
use crate::dsp::oscillator::Waveform;
use crate::error::ToneError;

pub const MIN_FREQUENCY: f64 = 0.1;
pub const MAX_FREQUENCY: f64 = 20_000.0;
pub const MAX_VOLUME: f64 = 100.0;
pub const MAX_HARMONIC_LEVEL: f64 = 100.0;

/// Overtone multipliers a tone can carry.
pub const HARMONIC_MULTIPLIERS: [u32; 4] = [2, 3, 4, 5];

/// Every sound the generator can make. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WaveformKind {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
    NoiseWhite,
    NoisePink,
    NoiseBrown,
    Binaural,
}

/// The render topology a `WaveformKind` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// One oscillator plus its harmonic stack.
    Tone(Waveform),
    /// Independent noise per channel.
    Noise(NoiseColor),
    /// A sine per ear, offset by the beat.
    Binaural,
}

impl WaveformKind {
    pub const ALL: [WaveformKind; 8] = [
        WaveformKind::Sine,
        WaveformKind::Square,
        WaveformKind::Sawtooth,
        WaveformKind::Triangle,
        WaveformKind::NoiseWhite,
        WaveformKind::NoisePink,
        WaveformKind::NoiseBrown,
        WaveformKind::Binaural,
    ];

    pub fn topology(self) -> Topology {
        match self {
            WaveformKind::Sine => Topology::Tone(Waveform::Sine),
            WaveformKind::Square => Topology::Tone(Waveform::Square),
            WaveformKind::Sawtooth => Topology::Tone(Waveform::Sawtooth),
            WaveformKind::Triangle => Topology::Tone(Waveform::Triangle),
            WaveformKind::NoiseWhite => Topology::Noise(NoiseColor::White),
            WaveformKind::NoisePink => Topology::Noise(NoiseColor::Pink),
            WaveformKind::NoiseBrown => Topology::Noise(NoiseColor::Brown),
            WaveformKind::Binaural => Topology::Binaural,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WaveformKind::Sine => "sine",
            WaveformKind::Square => "square",
            WaveformKind::Sawtooth => "sawtooth",
            WaveformKind::Triangle => "triangle",
            WaveformKind::NoiseWhite => "noise-white",
            WaveformKind::NoisePink => "noise-pink",
            WaveformKind::NoiseBrown => "noise-brown",
            WaveformKind::Binaural => "binaural",
        }
    }

    pub fn is_noise(self) -> bool {
        matches!(self.topology(), Topology::Noise(_))
    }
}

impl fmt::Display for WaveformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaveformKind {
    type Err = ToneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveformKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ToneError::invalid("waveform", format!("unknown waveform '{s}'")))
    }
}

/// Levels (0–100) for harmonics 2 through 5.
///
/// Serialized as a map keyed by multiplier, e.g. `{"2": 50, "3": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<u32, f64>", into = "BTreeMap<u32, f64>")]
pub struct HarmonicLevels {
    levels: [f64; 4],
}

impl HarmonicLevels {
    fn index(multiplier: u32) -> Option<usize> {
        HARMONIC_MULTIPLIERS.iter().position(|&k| k == multiplier)
    }

    /// Level for `multiplier`; zero for anything outside 2..=5.
    pub fn level(&self, multiplier: u32) -> f64 {
        Self::index(multiplier).map_or(0.0, |i| self.levels[i])
    }

    /// Set a level, clamped to 0–100. Unknown multipliers are ignored.
    pub fn set(&mut self, multiplier: u32, level: f64) {
        if let Some(i) = Self::index(multiplier) {
            self.levels[i] = clamp_or(level, 0.0, MAX_HARMONIC_LEVEL, 0.0);
        }
    }

    pub fn is_silent(&self) -> bool {
        self.levels.iter().all(|&l| l <= 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        HARMONIC_MULTIPLIERS.iter().copied().zip(self.levels.iter().copied())
    }
}

impl From<BTreeMap<u32, f64>> for HarmonicLevels {
    fn from(map: BTreeMap<u32, f64>) -> Self {
        let mut levels = HarmonicLevels::default();
        for (k, l) in map {
            levels.set(k, l);
        }
        levels
    }
}

impl From<HarmonicLevels> for BTreeMap<u32, f64> {
    fn from(levels: HarmonicLevels) -> Self {
        levels.iter().collect()
    }
}

/// Everything needed to describe the sound being generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneParameters {
    /// Hz, clamped to [0.1, 20000].
    pub frequency: f64,
    #[serde(rename = "waveType")]
    pub waveform: WaveformKind,
    /// 0–100, mapped linearly to gain 0.0–1.0.
    pub volume: f64,
    /// -1.0 (left) to 1.0 (right). Ignored in binaural mode.
    pub pan: f64,
    pub harmonics: HarmonicLevels,
    /// Right-ear offset in Hz; only used in binaural mode.
    #[serde(rename = "binauralBeat")]
    pub binaural_beat_hz: f64,
}

impl Default for ToneParameters {
    fn default() -> Self {
        ToneParameters {
            frequency: 440.0,
            waveform: WaveformKind::Sine,
            volume: 50.0,
            pan: 0.0,
            harmonics: HarmonicLevels::default(),
            binaural_beat_hz: 10.0,
        }
    }
}

impl ToneParameters {
    pub fn tone(frequency: f64, waveform: WaveformKind) -> Self {
        ToneParameters {
            frequency,
            waveform,
            ..Default::default()
        }
    }

    /// Linear output gain derived from `volume`.
    pub fn gain(&self) -> f64 {
        self.volume / MAX_VOLUME
    }

    /// Validate and clamp every field.
    ///
    /// Out-of-range numbers are clamped into range. Non-finite values
    /// are rejected, as is a non-positive beat in binaural mode.
    pub fn sanitized(mut self) -> Result<Self, ToneError> {
        self.frequency = clamp_finite("frequency", self.frequency, MIN_FREQUENCY, MAX_FREQUENCY)?;
        self.volume = clamp_finite("volume", self.volume, 0.0, MAX_VOLUME)?;
        self.pan = clamp_finite("pan", self.pan, -1.0, 1.0)?;
        if self.waveform == WaveformKind::Binaural {
            check_beat(self.binaural_beat_hz)?;
        }
        Ok(self)
    }

    /// Whether switching from `self` to `other` needs a fresh source graph
    /// rather than a live parameter write.
    pub fn needs_rebuild(&self, other: &ToneParameters) -> bool {
        if self.waveform != other.waveform {
            return true;
        }
        match self.waveform.topology() {
            Topology::Tone(_) => self.harmonics != other.harmonics,
            Topology::Binaural => self.binaural_beat_hz != other.binaural_beat_hz,
            Topology::Noise(_) => false,
        }
    }
}

/// Clamp a frequency into the supported range, mapping NaN to the floor.
pub fn clamp_frequency(frequency: f64) -> f64 {
    clamp_or(frequency, MIN_FREQUENCY, MAX_FREQUENCY, MIN_FREQUENCY)
}

fn clamp_or(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}

fn clamp_finite(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ToneError> {
    if value.is_nan() {
        return Err(ToneError::invalid(field, "value is not a number"));
    }
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{field} {value} out of range, clamped to {clamped}");
    }
    Ok(clamped)
}
