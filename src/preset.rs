//! Built-in presets: named tone settings grouped by purpose.
//!
//! Presets are plain `ToneParameters` plus a label, so hosts can show
//! them in a picker and hand the parameters straight to the engine.

use serde::{Deserialize, Serialize};

use crate::params::{HarmonicLevels, ToneParameters, WaveformKind};

// ── Preset Descriptor ───────────────────────────────────────

/// Preset categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetCategory {
    Music,
    Test,
    Therapy,
    Special,
    /// Saved by the user; never part of the built-in catalog.
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TonePreset {
    pub name: String,
    pub category: PresetCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub params: ToneParameters,
}

impl TonePreset {
    fn new(name: &str, category: PresetCategory, params: ToneParameters) -> Self {
        TonePreset {
            name: name.to_string(),
            category,
            description: None,
            params,
        }
    }

    fn sine(name: &str, category: PresetCategory, frequency: f64) -> Self {
        Self::new(name, category, ToneParameters::tone(frequency, WaveformKind::Sine))
    }

    fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

// ── Catalog ─────────────────────────────────────────────────

/// The built-in catalog, in display order.
pub fn builtin_presets() -> Vec<TonePreset> {
    use PresetCategory::*;

    let mut binaural = ToneParameters::tone(200.0, WaveformKind::Binaural);
    binaural.binaural_beat_hz = 10.0;

    let mut rich = ToneParameters::tone(220.0, WaveformKind::Sine);
    rich.harmonics = HarmonicLevels::from(std::collections::BTreeMap::from([
        (2, 50.0),
        (3, 30.0),
        (4, 20.0),
        (5, 10.0),
    ]));

    let mut panned = ToneParameters::tone(500.0, WaveformKind::Sine);
    panned.pan = 0.5;

    vec![
        // Musical notes
        TonePreset::sine("A4 (Concert Pitch)", Music, 440.0),
        TonePreset::sine("Middle C (C4)", Music, 261.63),
        TonePreset::sine("E Guitar (E2)", Music, 82.41),
        TonePreset::sine("Bass Guitar (E1)", Music, 41.2),
        // Test tones
        TonePreset::sine("1kHz Test Tone", Test, 1000.0),
        TonePreset::sine("10kHz High Frequency", Test, 10_000.0),
        TonePreset::sine("50Hz Low Frequency", Test, 50.0),
        TonePreset::new("White Noise", Test, ToneParameters::tone(440.0, WaveformKind::NoiseWhite)),
        // Therapeutic
        TonePreset::sine("Alpha Waves (10Hz)", Therapy, 10.0),
        TonePreset::sine("Theta Waves (6Hz)", Therapy, 6.0),
        TonePreset::sine("Delta Waves (2Hz)", Therapy, 2.0),
        TonePreset::new("Binaural Beat (10Hz)", Therapy, binaural).described("Carrier: 200Hz, Beat: 10Hz"),
        TonePreset::sine("Meditation Tone", Therapy, 432.0).described("Alternative tuning frequency"),
        TonePreset::sine("Healing Frequency", Therapy, 528.0).described("Solfeggio frequency"),
        // Special
        TonePreset::sine("Subwoofer Test (30Hz)", Special, 30.0),
        TonePreset::sine("Dog Whistle (20kHz)", Special, 20_000.0),
        TonePreset::new("Rich Harmonic Tone", Special, rich),
        TonePreset::new("Stereo Pan Test", Special, panned),
    ]
}

/// Look up a built-in preset by exact name.
pub fn find_preset(name: &str) -> Option<TonePreset> {
    builtin_presets().into_iter().find(|p| p.name == name)
}

/// Built-in presets in one category.
pub fn presets_in(category: PresetCategory) -> Vec<TonePreset> {
    builtin_presets().into_iter().filter(|p| p.category == category).collect()
}
