//! Musical notes and descriptive frequency information.

use std::fmt;

use serde::Serialize;

use crate::params::{MAX_FREQUENCY, MIN_FREQUENCY};

/// Concert pitch A4 in Hz.
pub const A4_HZ: f64 = 440.0;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#/Db", "D", "D#/Eb", "E", "F", "F#/Gb", "G", "G#/Ab", "A", "A#/Bb", "B",
];

/// Name of the equal-tempered note nearest to `freq`, e.g. `"A4"` or `"C#/Db5"`.
///
/// Returns `None` for non-positive or non-finite input.
pub fn closest_note_name(freq: f64) -> Option<String> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    let half_steps = (12.0 * (freq / A4_HZ).log2()).round() as i64;
    let octave = 4 + (half_steps + 9).div_euclid(12);
    let index = (half_steps + 9).rem_euclid(12) as usize;
    Some(format!("{}{}", NOTE_NAMES[index], octave))
}

/// Convert frequency to the nearest MIDI note and the cents offset from it.
pub fn freq_to_midi_cents(freq: f64, a4_freq: f64) -> (u8, f64) {
    if freq <= 0.0 {
        return (0, 0.0);
    }
    let midi_float = 69.0 + 12.0 * (freq / a4_freq).log2();
    let midi_note = midi_float.round() as i32;
    let cents = (midi_float - midi_note as f64) * 100.0;

    let clamped = midi_note.clamp(0, 127) as u8;
    (clamped, cents)
}

/// Frequency of a MIDI note.
pub fn midi_to_freq(note: u8, a4_freq: f64) -> f64 {
    a4_freq * 2f64.powf((note as f64 - 69.0) / 12.0)
}

/// Audible range classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrequencyBand {
    Infrasound,
    SubBass,
    Bass,
    LowerMidrange,
    Midrange,
    UpperMidrange,
    Presence,
    Brilliance,
    Ultrasound,
}

impl FrequencyBand {
    pub fn classify(freq: f64) -> Self {
        match freq {
            f if f < 20.0 => FrequencyBand::Infrasound,
            f if f < 60.0 => FrequencyBand::SubBass,
            f if f < 250.0 => FrequencyBand::Bass,
            f if f < 500.0 => FrequencyBand::LowerMidrange,
            f if f < 2000.0 => FrequencyBand::Midrange,
            f if f < 4000.0 => FrequencyBand::UpperMidrange,
            f if f < 10_000.0 => FrequencyBand::Presence,
            f if f <= 20_000.0 => FrequencyBand::Brilliance,
            _ => FrequencyBand::Ultrasound,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FrequencyBand::Infrasound => "Infrasound",
            FrequencyBand::SubBass => "Sub-bass",
            FrequencyBand::Bass => "Bass",
            FrequencyBand::LowerMidrange => "Lower midrange",
            FrequencyBand::Midrange => "Midrange",
            FrequencyBand::UpperMidrange => "Upper midrange",
            FrequencyBand::Presence => "Presence",
            FrequencyBand::Brilliance => "Brilliance",
            FrequencyBand::Ultrasound => "Ultrasound",
        }
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Brainwave band a binaural beat falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrainwaveBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl BrainwaveBand {
    pub fn classify(beat_hz: f64) -> Self {
        match beat_hz {
            b if b < 4.0 => BrainwaveBand::Delta,
            b if b < 8.0 => BrainwaveBand::Theta,
            b if b < 14.0 => BrainwaveBand::Alpha,
            b if b < 30.0 => BrainwaveBand::Beta,
            _ => BrainwaveBand::Gamma,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BrainwaveBand::Delta => "Deep sleep, healing",
            BrainwaveBand::Theta => "Meditation, creativity",
            BrainwaveBand::Alpha => "Relaxation, calmness",
            BrainwaveBand::Beta => "Focus, alertness",
            BrainwaveBand::Gamma => "Peak concentration",
        }
    }
}

/// Step a frequency by `delta`.
///
/// Fine steps (|delta| < 1) are rounded to two decimals so repeated
/// nudges do not accumulate float noise. Every result is clamped to the
/// supported range.
pub fn nudge_frequency(freq: f64, delta: f64) -> f64 {
    let next = freq + delta;
    let next = if delta.abs() < 1.0 {
        (next * 100.0).round() / 100.0
    } else {
        next
    };
    next.clamp(MIN_FREQUENCY, MAX_FREQUENCY)
}

/// Human-readable frequency, e.g. `"440 Hz"`, `"12.50 kHz"`.
pub fn format_frequency(freq: f64) -> String {
    if freq >= 1000.0 {
        format!("{:.2} kHz", freq / 1000.0)
    } else if freq < 10.0 {
        format!("{freq:.2} Hz")
    } else if freq < 100.0 {
        format!("{freq:.1} Hz")
    } else {
        format!("{freq:.0} Hz")
    }
}
