//! Harmonic stack: overtones at integer multiples of a base tone.

use crate::params::{HARMONIC_MULTIPLIERS, HarmonicLevels};

use super::oscillator::{Waveform, WaveformSource};

/// A single active overtone.
#[derive(Debug, Clone)]
pub struct Harmonic {
    pub multiplier: u32,
    pub source: WaveformSource,
}

/// The set of overtones layered on a base tone.
///
/// Only harmonics with a level above zero get a source. The set is built
/// once from a level snapshot; changing levels means building a new stack.
#[derive(Debug, Clone, Default)]
pub struct HarmonicStack {
    harmonics: Vec<Harmonic>,
}

impl HarmonicStack {
    pub fn new(waveform: Waveform, base_frequency: f64, levels: &HarmonicLevels, sample_rate: f64) -> Self {
        let harmonics = HARMONIC_MULTIPLIERS
            .iter()
            .filter_map(|&k| {
                let level = levels.level(k);
                (level > 0.0).then(|| Harmonic {
                    multiplier: k,
                    source: WaveformSource::with_amplitude(
                        waveform,
                        base_frequency * k as f64,
                        level / 100.0,
                        sample_rate,
                    ),
                })
            })
            .collect();

        HarmonicStack { harmonics }
    }

    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }

    pub fn harmonics(&self) -> &[Harmonic] {
        &self.harmonics
    }

    /// Retune every overtone to follow a new base frequency, in one pass.
    pub fn set_base_frequency(&mut self, base_frequency: f64) {
        for h in &mut self.harmonics {
            h.source.set_frequency(base_frequency * h.multiplier as f64);
        }
    }

    /// Sum of all overtone samples for the next frame.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        self.harmonics.iter_mut().map(|h| h.source.next_sample()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn levels(pairs: &[(u32, f64)]) -> HarmonicLevels {
        let mut levels = HarmonicLevels::default();
        for &(k, l) in pairs {
            levels.set(k, l);
        }
        levels
    }

    /// Magnitude of the DFT bin at `freq`, normalized so a unit sine reads 1.0.
    fn dft_magnitude(signal: &[f64], freq: f64, sample_rate: f64) -> f64 {
        let (mut re, mut im) = (0.0, 0.0);
        for (i, &s) in signal.iter().enumerate() {
            let w = TAU * freq * i as f64 / sample_rate;
            re += s * w.cos();
            im -= s * w.sin();
        }
        2.0 * (re * re + im * im).sqrt() / signal.len() as f64
    }

    #[test]
    fn silent_harmonics_create_no_sources() {
        let stack = HarmonicStack::new(Waveform::Sine, 220.0, &levels(&[(2, 50.0)]), 44100.0);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.harmonics()[0].multiplier, 2);
        assert!((stack.harmonics()[0].source.frequency() - 440.0).abs() < 1e-12);
        assert!((stack.harmonics()[0].source.amplitude() - 0.5).abs() < 1e-12);

        let empty = HarmonicStack::new(Waveform::Sine, 220.0, &HarmonicLevels::default(), 44100.0);
        assert!(empty.is_empty());
    }

    #[test]
    fn second_harmonic_at_half_level_shows_only_two_peaks() {
        let sample_rate = 44100.0;
        let mut base = WaveformSource::new(Waveform::Sine, 220.0, sample_rate);
        let mut stack = HarmonicStack::new(Waveform::Sine, 220.0, &levels(&[(2, 50.0), (3, 0.0)]), sample_rate);

        // 0.2 s holds exactly 44 cycles of 220 Hz, so every probe lands on a bin.
        let signal: Vec<f64> = (0..8820).map(|_| base.next_sample() + stack.next_sample()).collect();

        let fundamental = dft_magnitude(&signal, 220.0, sample_rate);
        let second = dft_magnitude(&signal, 440.0, sample_rate);
        assert!((fundamental - 1.0).abs() < 0.01, "220 Hz peak {fundamental}");
        assert!((second - 0.5).abs() < 0.01, "440 Hz peak {second}");

        for probe in [110.0, 330.0, 660.0, 880.0, 1100.0, 1320.0] {
            let m = dft_magnitude(&signal, probe, sample_rate);
            assert!(m < 0.01, "unexpected energy at {probe} Hz: {m}");
        }
    }

    #[test]
    fn retune_follows_base() {
        let mut stack = HarmonicStack::new(Waveform::Square, 100.0, &levels(&[(3, 30.0), (5, 10.0)]), 44100.0);
        stack.set_base_frequency(200.0);
        let freqs: Vec<f64> = stack.harmonics().iter().map(|h| h.source.frequency()).collect();
        assert_eq!(freqs, vec![600.0, 1000.0]);
    }
}
