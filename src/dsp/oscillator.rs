//! Naive phase-accumulator oscillators for the basic periodic waveforms.
//!
//! The phase is kept in radians and wrapped into [0, 2π). Changing the
//! frequency never touches the phase, so a live retune only changes the
//! slope of the accumulator and does not click.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Supported periodic waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Evaluate the waveform at phase `phase` (radians, in [0, 2π)).
    #[inline]
    pub fn evaluate(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Square => {
                let s = phase.sin();
                if s > 0.0 {
                    1.0
                } else if s < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Waveform::Sawtooth => centered_ramp(phase),
            Waveform::Triangle => 2.0 * centered_ramp(phase).abs() - 1.0,
        }
    }
}

/// `2·(φ/2π − floor(φ/2π + 0.5))`: a ramp through zero at φ = 0.
#[inline]
fn centered_ramp(phase: f64) -> f64 {
    let cycles = phase / TAU;
    2.0 * (cycles - (cycles + 0.5).floor())
}

/// A single oscillator with a carried phase accumulator.
#[derive(Debug, Clone)]
pub struct WaveformSource {
    pub waveform: Waveform,
    frequency: f64,
    amplitude: f64,
    phase: f64,
    sample_rate: f64,
}

impl WaveformSource {
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        WaveformSource {
            waveform,
            frequency,
            amplitude: 1.0,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Same as `new`, scaled by a fixed output amplitude.
    pub fn with_amplitude(waveform: Waveform, frequency: f64, amplitude: f64, sample_rate: f64) -> Self {
        let mut source = Self::new(waveform, frequency, sample_rate);
        source.amplitude = amplitude;
        source
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Current phase in radians, always in [0, 2π).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Retune without resetting the phase.
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    /// Phase increment per sample, in radians.
    fn phase_inc(&self) -> f64 {
        TAU * self.frequency / self.sample_rate
    }

    /// Generate the next sample and advance the phase.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let sample = self.waveform.evaluate(self.phase) * self.amplitude;

        self.phase = (self.phase + self.phase_inc()).rem_euclid(TAU);

        sample
    }

    /// Reset oscillator phase.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_zero_at_start() {
        let mut osc = WaveformSource::new(Waveform::Sine, 440.0, 44100.0);
        let sample = osc.next_sample();
        assert!(sample.abs() < 1e-10, "Sine should start near 0, got {sample}");
    }

    #[test]
    fn every_waveform_stays_in_range_across_the_audible_band() {
        let frequencies = [0.1, 1.0, 20.0, 440.0, 1234.5, 10_000.0, 19_999.9, 20_000.0];
        for waveform in Waveform::ALL {
            for &freq in &frequencies {
                let mut osc = WaveformSource::new(waveform, freq, 44100.0);
                for _ in 0..8192 {
                    let s = osc.next_sample();
                    assert!(
                        (-1.0..=1.0).contains(&s),
                        "{waveform:?} at {freq} Hz out of range: {s}"
                    );
                }
            }
        }
    }

    #[test]
    fn phase_stays_wrapped() {
        let mut osc = WaveformSource::new(Waveform::Sawtooth, 19_000.0, 44100.0);
        for _ in 0..10_000 {
            osc.next_sample();
            assert!(osc.phase() >= 0.0 && osc.phase() < TAU, "phase {}", osc.phase());
        }
    }

    #[test]
    fn phase_wraps_for_negative_increment() {
        let mut osc = WaveformSource::new(Waveform::Sine, 440.0, 44100.0);
        osc.set_frequency(-1000.0);
        for _ in 0..1000 {
            osc.next_sample();
            assert!(osc.phase() >= 0.0 && osc.phase() <= TAU, "phase {}", osc.phase());
        }
    }

    #[test]
    fn retune_keeps_phase() {
        let mut osc = WaveformSource::new(Waveform::Sine, 440.0, 44100.0);
        for _ in 0..100 {
            osc.next_sample();
        }
        let before = osc.phase();
        osc.set_frequency(880.0);
        assert_eq!(osc.phase(), before, "frequency change must not reset phase");
        let s = osc.next_sample();
        assert!((s - before.sin()).abs() < 1e-12, "first sample after retune continues the curve");
    }

    #[test]
    fn waveform_shapes_at_key_phases() {
        use std::f64::consts::{FRAC_PI_2, PI};

        assert_eq!(Waveform::Square.evaluate(FRAC_PI_2), 1.0);
        assert_eq!(Waveform::Square.evaluate(PI + FRAC_PI_2), -1.0);
        assert_eq!(Waveform::Square.evaluate(0.0), 0.0);

        assert!((Waveform::Sawtooth.evaluate(0.0)).abs() < 1e-12);
        assert!((Waveform::Sawtooth.evaluate(FRAC_PI_2) - 0.5).abs() < 1e-12);
        assert!((Waveform::Sawtooth.evaluate(PI) + 1.0).abs() < 1e-12, "saw wraps to -1 at half cycle");

        assert!((Waveform::Triangle.evaluate(0.0) + 1.0).abs() < 1e-12);
        assert!((Waveform::Triangle.evaluate(FRAC_PI_2)).abs() < 1e-12);
        assert!((Waveform::Triangle.evaluate(PI) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn amplitude_scales_output() {
        let mut osc = WaveformSource::with_amplitude(Waveform::Square, 100.0, 0.25, 44100.0);
        osc.next_sample();
        let s = osc.next_sample();
        assert!((s - 0.25).abs() < 1e-12, "scaled square should be 0.25, got {s}");
    }

    #[test]
    fn one_second_completes_whole_cycles() {
        let mut osc = WaveformSource::new(Waveform::Sine, 441.0, 44100.0);
        for _ in 0..44100 {
            osc.next_sample();
        }
        let wrapped = osc.phase().min(TAU - osc.phase());
        assert!(wrapped < 1e-6, "441 whole cycles should land back at phase 0, got {}", osc.phase());
    }
}
