//! The active signal topology.
//!
//! Tone, noise and binaural playback are mutually exclusive; a
//! `SignalSource` is exactly one of them and owns every generator it needs.

use crate::error::ToneError;
use crate::params::{Topology, ToneParameters};

use super::binaural::BinauralPair;
use super::harmonics::HarmonicStack;
use super::noise::StereoNoise;
use super::oscillator::WaveformSource;

/// How the two channels of a frame relate, which decides the pan law.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Both channels carry the same signal.
    Mono,
    /// Independent left and right signals.
    Stereo,
    /// One signal per ear that must not be panned.
    Dichotic,
}

/// Where a source draws its noise seed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseSeed {
    Entropy,
    Fixed(u64),
}

#[derive(Debug, Clone)]
pub enum SignalSource {
    Tone {
        base: WaveformSource,
        harmonics: HarmonicStack,
    },
    Noise(StereoNoise),
    Binaural(BinauralPair),
}

impl SignalSource {
    /// Build fresh generators (phase 0, zeroed filters) for `params`.
    pub fn build(params: &ToneParameters, sample_rate: f64, seed: NoiseSeed) -> Result<Self, ToneError> {
        let source = match params.waveform.topology() {
            Topology::Tone(waveform) => SignalSource::Tone {
                base: WaveformSource::new(waveform, params.frequency, sample_rate),
                harmonics: HarmonicStack::new(waveform, params.frequency, &params.harmonics, sample_rate),
            },
            Topology::Noise(color) => SignalSource::Noise(match seed {
                NoiseSeed::Entropy => StereoNoise::from_entropy(color),
                NoiseSeed::Fixed(seed) => StereoNoise::seeded(color, seed),
            }),
            Topology::Binaural => {
                SignalSource::Binaural(BinauralPair::new(params.frequency, params.binaural_beat_hz, sample_rate)?)
            }
        };
        Ok(source)
    }

    pub fn layout(&self) -> ChannelLayout {
        match self {
            SignalSource::Tone { .. } => ChannelLayout::Mono,
            SignalSource::Noise(_) => ChannelLayout::Stereo,
            SignalSource::Binaural(_) => ChannelLayout::Dichotic,
        }
    }

    /// Push a new base frequency into the running generators.
    /// Noise has no frequency and ignores it.
    pub fn set_frequency(&mut self, frequency: f64) {
        match self {
            SignalSource::Tone { base, harmonics } => {
                base.set_frequency(frequency);
                harmonics.set_base_frequency(frequency);
            }
            SignalSource::Noise(_) => {}
            SignalSource::Binaural(pair) => pair.set_carrier(frequency),
        }
    }

    /// Current base frequency, if the topology has one.
    pub fn frequency(&self) -> Option<f64> {
        match self {
            SignalSource::Tone { base, .. } => Some(base.frequency()),
            SignalSource::Noise(_) => None,
            SignalSource::Binaural(pair) => Some(pair.carrier()),
        }
    }

    /// Number of running generators, for teardown accounting.
    pub fn generator_count(&self) -> usize {
        match self {
            SignalSource::Tone { harmonics, .. } => 1 + harmonics.len(),
            SignalSource::Noise(_) => 2,
            SignalSource::Binaural(_) => 2,
        }
    }

    /// Next (left, right) frame before gain and pan.
    #[inline]
    pub fn next_frame(&mut self) -> (f64, f64) {
        match self {
            SignalSource::Tone { base, harmonics } => {
                let s = base.next_sample() + harmonics.next_sample();
                (s, s)
            }
            SignalSource::Noise(noise) => noise.next_frame(),
            SignalSource::Binaural(pair) => pair.next_frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveformKind;

    #[test]
    fn builds_one_topology_per_kind() {
        for kind in WaveformKind::ALL {
            let params = ToneParameters::tone(300.0, kind);
            let source = SignalSource::build(&params, 44100.0, NoiseSeed::Fixed(1)).unwrap();
            let expected = match kind.topology() {
                Topology::Tone(_) => ChannelLayout::Mono,
                Topology::Noise(_) => ChannelLayout::Stereo,
                Topology::Binaural => ChannelLayout::Dichotic,
            };
            assert_eq!(source.layout(), expected, "{kind}");
        }
    }

    #[test]
    fn tone_frames_are_mono() {
        let mut params = ToneParameters::tone(220.0, WaveformKind::Triangle);
        params.harmonics.set(3, 40.0);
        let mut source = SignalSource::build(&params, 44100.0, NoiseSeed::Entropy).unwrap();
        assert_eq!(source.generator_count(), 2);
        for _ in 0..512 {
            let (l, r) = source.next_frame();
            assert_eq!(l, r);
        }
    }

    #[test]
    fn binaural_with_bad_beat_fails_to_build() {
        let mut params = ToneParameters::tone(200.0, WaveformKind::Binaural);
        params.binaural_beat_hz = -1.0;
        assert!(SignalSource::build(&params, 44100.0, NoiseSeed::Entropy).is_err());
    }

    #[test]
    fn frequency_push_reaches_every_generator() {
        let mut params = ToneParameters::tone(100.0, WaveformKind::Sine);
        params.harmonics.set(2, 50.0);
        let mut source = SignalSource::build(&params, 44100.0, NoiseSeed::Entropy).unwrap();
        source.set_frequency(150.0);
        match &source {
            SignalSource::Tone { base, harmonics } => {
                assert_eq!(base.frequency(), 150.0);
                assert_eq!(harmonics.harmonics()[0].source.frequency(), 300.0);
            }
            other => panic!("expected tone, got {other:?}"),
        }

        let mut noise = SignalSource::build(&ToneParameters::tone(100.0, WaveformKind::NoiseWhite), 44100.0, NoiseSeed::Fixed(3)).unwrap();
        noise.set_frequency(500.0);
        assert_eq!(noise.frequency(), None);
    }
}
