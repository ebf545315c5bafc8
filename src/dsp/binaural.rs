//! Binaural beat pair: one sine per ear, offset by the beat frequency.

use crate::error::ToneError;

use super::oscillator::{Waveform, WaveformSource};

#[derive(Debug, Clone)]
pub struct BinauralPair {
    left: WaveformSource,
    right: WaveformSource,
    beat: f64,
}

impl BinauralPair {
    /// Left ear at `carrier`, right ear at `carrier + beat`.
    ///
    /// Fails when `beat` is not strictly positive.
    pub fn new(carrier: f64, beat: f64, sample_rate: f64) -> Result<Self, ToneError> {
        check_beat(beat)?;
        Ok(BinauralPair {
            left: WaveformSource::new(Waveform::Sine, carrier, sample_rate),
            right: WaveformSource::new(Waveform::Sine, carrier + beat, sample_rate),
            beat,
        })
    }

    pub fn carrier(&self) -> f64 {
        self.left.frequency()
    }

    pub fn beat(&self) -> f64 {
        self.beat
    }

    pub fn right_frequency(&self) -> f64 {
        self.right.frequency()
    }

    /// Move the carrier; the right ear keeps the same offset.
    pub fn set_carrier(&mut self, carrier: f64) {
        self.left.set_frequency(carrier);
        self.right.set_frequency(carrier + self.beat);
    }

    /// Next (left, right) frame. No crossfeed between ears.
    #[inline]
    pub fn next_frame(&mut self) -> (f64, f64) {
        (self.left.next_sample(), self.right.next_sample())
    }
}

pub(crate) fn check_beat(beat: f64) -> Result<(), ToneError> {
    if beat.is_finite() && beat > 0.0 {
        Ok(())
    } else {
        Err(ToneError::invalid(
            "binaural_beat_hz",
            format!("beat must be a positive frequency, got {beat}"),
        ))
    }
}
