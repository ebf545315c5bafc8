//! Tuner: autocorrelation pitch detection for captured input.
//!
//! For every lag ℓ in [min_lag, N/2) the detector correlates the first
//! half of the buffer with itself shifted by ℓ. The raw correlation,
//! normalized by N/2, gates acceptance; the energy-normalized correlation
//! picks the lag and serves as the confidence.
//!
//! The lag search is O(N²) over the half buffer. That is fine for the
//! 2048–4096 sample windows analysers hand out; much larger buffers
//! should be decimated first.

use serde::{Deserialize, Serialize};

use crate::notes::freq_to_midi_cents;

/// Detector tuning. Defaults follow the analyser the engine was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectorConfig {
    /// Shortest lag searched, in samples.
    pub min_lag: usize,
    /// Raw correlation (normalized by N/2) the best lag must exceed.
    pub correlation_threshold: f64,
    /// Input RMS below which the lag search is skipped. Zero disables the gate.
    pub rms_gate: f64,
    /// Normalized correlation the best lag must reach.
    pub min_confidence: f64,
    /// Earliest peak within this fraction of the strongest peak wins,
    /// so a lag spanning several periods does not beat the fundamental.
    pub peak_tolerance: f64,
    pub min_frequency: f64,
    pub max_frequency: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            min_lag: 10,
            correlation_threshold: 0.01,
            rms_gate: 0.01,
            min_confidence: 0.3,
            peak_tolerance: 0.9,
            min_frequency: 20.0,
            max_frequency: 20_000.0,
        }
    }
}

/// Result of a successful detection.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchEstimate {
    /// Estimated fundamental frequency in Hz.
    pub frequency: f64,
    /// Normalized correlation at the chosen lag, in [0, 1].
    pub confidence: f64,
    /// Raw correlation at the chosen lag, normalized by N/2.
    pub correlation: f64,
    /// Nearest MIDI note number.
    pub midi_note: u8,
    /// Offset in cents from the nearest MIDI note.
    pub cents: f64,
}

#[derive(Debug, Clone, Default)]
pub struct PitchDetector {
    pub config: DetectorConfig,
}

impl PitchDetector {
    pub fn new(config: DetectorConfig) -> Self {
        PitchDetector { config }
    }

    /// Estimate the fundamental of `samples`.
    ///
    /// Returns `None` when the input is too quiet, too short, or no lag
    /// correlates strongly enough: a miss is a normal outcome.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
        let cfg = &self.config;
        let half = samples.len() / 2;
        let min_lag = cfg.min_lag.max(1);
        if half < min_lag + 3 || sample_rate == 0 {
            return None;
        }

        if cfg.rms_gate > 0.0 && rms(samples) < cfg.rms_gate {
            return None;
        }

        let x: Vec<f64> = samples.iter().map(|&s| s as f64).collect();
        let head = &x[..half];
        let head_energy: f64 = head.iter().map(|v| v * v).sum();
        if head_energy <= 0.0 {
            return None;
        }

        // raw[ℓ] = Σ x[i]·x[i+ℓ] / (N/2); nccf[ℓ] = Σ x[i]·x[i+ℓ] / √(E₀·E_ℓ)
        let mut raw = vec![0.0f64; half];
        let mut nccf = vec![0.0f64; half];
        let mut lag_energy: f64 = x[min_lag..min_lag + half].iter().map(|v| v * v).sum();
        for lag in min_lag..half {
            if lag > min_lag {
                lag_energy += x[lag + half - 1] * x[lag + half - 1] - x[lag - 1] * x[lag - 1];
            }
            let sum: f64 = head.iter().zip(&x[lag..lag + half]).map(|(a, b)| a * b).sum();
            raw[lag] = sum / half as f64;
            let denom = (head_energy * lag_energy.max(0.0)).sqrt();
            nccf[lag] = if denom > 0.0 { sum / denom } else { 0.0 };
        }

        let best = (min_lag..half).fold(min_lag, |best, lag| if nccf[lag] > nccf[best] { lag } else { best });
        let target = nccf[best] * cfg.peak_tolerance;
        let chosen = (min_lag + 1..half - 1)
            .find(|&lag| nccf[lag] >= nccf[lag - 1] && nccf[lag] >= nccf[lag + 1] && nccf[lag] >= target)
            .unwrap_or(best);

        let correlation = raw[chosen];
        let confidence = nccf[chosen].clamp(0.0, 1.0);
        if correlation <= cfg.correlation_threshold || confidence < cfg.min_confidence {
            return None;
        }

        // Parabolic interpolation for sub-sample accuracy
        let refined = if chosen > min_lag && chosen + 1 < half {
            let (alpha, beta, gamma) = (nccf[chosen - 1], nccf[chosen], nccf[chosen + 1]);
            let denom = alpha - 2.0 * beta + gamma;
            if denom.abs() > 1e-12 {
                chosen as f64 + 0.5 * (alpha - gamma) / denom
            } else {
                chosen as f64
            }
        } else {
            chosen as f64
        };

        let frequency = sample_rate as f64 / refined;
        if !(cfg.min_frequency..=cfg.max_frequency).contains(&frequency) {
            return None;
        }

        let (midi_note, cents) = freq_to_midi_cents(frequency, 440.0);
        Some(PitchEstimate {
            frequency,
            confidence,
            correlation,
            midi_note,
            cents,
        })
    }
}

/// Root-mean-square level of a buffer.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn generate_sine(freq: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                let t = i as f64 / sample_rate as f64;
                (2.0 * PI * freq * t).sin() as f32
            })
            .collect()
    }

    #[test]
    fn detect_a4_440hz() {
        let samples = generate_sine(440.0, 44100, 2048);
        let detector = PitchDetector::default();
        let result = detector.detect(&samples, 44100).expect("440 Hz sine should be detected");

        assert!((result.frequency - 440.0).abs() < 1.0, "Expected ~440Hz, got {}", result.frequency);
        assert!(result.correlation > detector.config.correlation_threshold);
        assert!(result.confidence > 0.9, "Confidence should be high: {}", result.confidence);
        assert_eq!(result.midi_note, 69, "A4 should be MIDI 69");
    }

    #[test]
    fn detect_c4_262hz() {
        let samples = generate_sine(261.63, 44100, 2048);
        let result = PitchDetector::default().detect(&samples, 44100).unwrap();
        assert!((result.frequency - 261.63).abs() < 1.0, "Expected ~261.63Hz, got {}", result.frequency);
        assert_eq!(result.midi_note, 60, "C4 should be MIDI 60");
    }

    #[test]
    fn detect_low_frequency() {
        let samples = generate_sine(82.41, 44100, 4096); // E2
        let result = PitchDetector::default().detect(&samples, 44100).unwrap();
        assert!((result.frequency - 82.41).abs() < 1.0, "Expected ~82.41Hz, got {}", result.frequency);
        assert_eq!(result.midi_note, 40, "E2 should be MIDI 40");
    }

    #[test]
    fn detect_high_frequency() {
        let samples = generate_sine(1000.0, 44100, 2048);
        let result = PitchDetector::default().detect(&samples, 44100).unwrap();
        assert!((result.frequency - 1000.0).abs() < 2.0, "Expected ~1000Hz, got {}", result.frequency);
    }

    #[test]
    fn quiet_input_is_gated() {
        let samples: Vec<f32> = generate_sine(440.0, 44100, 2048).iter().map(|s| s * 0.005).collect();
        assert!(PitchDetector::default().detect(&samples, 44100).is_none());

        let ungated = PitchDetector::new(DetectorConfig {
            rms_gate: 0.0,
            correlation_threshold: 0.0,
            ..Default::default()
        });
        assert!(ungated.detect(&samples, 44100).is_some(), "without the gate the tone is still periodic");
    }

    #[test]
    fn white_noise_is_a_miss() {
        let mut rng = StdRng::seed_from_u64(12345);
        let samples: Vec<f32> = (0..2048).map(|_| rng.gen_range(-1.0..=1.0)).collect();
        assert!(PitchDetector::default().detect(&samples, 44100).is_none());
    }

    #[test]
    fn silence_and_short_buffers_are_misses() {
        let detector = PitchDetector::default();
        assert!(detector.detect(&[], 44100).is_none());
        assert!(detector.detect(&[0.0; 2048], 44100).is_none());
        assert!(detector.detect(&[0.5; 12], 44100).is_none());
    }

    #[test]
    fn rms_of_full_scale_square() {
        let samples: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((rms(&samples) - 1.0).abs() < 1e-12);
    }
}
