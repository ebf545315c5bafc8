//! One playback run: every live generator plus its mix bus.
//!
//! Dropping the session drops all of it, noise filter memory included.

use crate::dsp::analysis::TapWriter;
use crate::dsp::block::SampleBlock;
use crate::dsp::mixer::MixBus;
use crate::dsp::source::{NoiseSeed, SignalSource};
use crate::error::ToneError;
use crate::params::ToneParameters;

use super::timer::SessionTimer;

#[derive(Debug)]
pub struct PlaybackSession {
    /// Parameter generation this session last applied.
    generation: u64,
    /// Parameters as last applied.
    params: ToneParameters,
    source: SignalSource,
    bus: MixBus,
    timer: SessionTimer,
}

impl PlaybackSession {
    /// Build fresh generators for `params`.
    pub fn build(
        generation: u64,
        params: ToneParameters,
        sample_rate: f64,
        timer: SessionTimer,
    ) -> Result<Self, ToneError> {
        let source = SignalSource::build(&params, sample_rate, NoiseSeed::Entropy)?;
        let bus = MixBus::new(params.gain(), params.pan);
        Ok(PlaybackSession {
            generation,
            params,
            source,
            bus,
            timer,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> &ToneParameters {
        &self.params
    }

    pub fn source(&self) -> &SignalSource {
        &self.source
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut SessionTimer {
        &mut self.timer
    }

    /// Apply a snapshot that does not change the topology.
    ///
    /// Frequency is only pushed when it changed, so a running sweep is not
    /// overridden by unrelated volume or pan edits.
    pub fn apply_live(&mut self, generation: u64, params: ToneParameters) {
        if params.frequency != self.params.frequency {
            self.source.set_frequency(params.frequency);
        }
        self.bus.set_gain(params.gain());
        self.bus.set_pan(params.pan);
        self.params = params;
        self.generation = generation;
    }

    /// Push a frequency straight into the generators (used by sweeps).
    pub fn set_frequency(&mut self, frequency: f64) {
        self.source.set_frequency(frequency);
    }

    pub fn frequency(&self) -> Option<f64> {
        self.source.frequency()
    }

    pub fn attach_tap(&mut self, tap: TapWriter) {
        self.bus.attach_tap(tap);
    }

    pub fn detach_tap(&mut self) -> Option<TapWriter> {
        self.bus.detach_tap()
    }

    pub fn render(&mut self, block: &mut SampleBlock) {
        self.bus.process(&mut self.source, block);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveformKind;

    #[test]
    fn live_edits_keep_generators() {
        let params = ToneParameters::tone(440.0, WaveformKind::Sine);
        let mut session = PlaybackSession::build(1, params.clone(), 44100.0, SessionTimer::default()).unwrap();
        let mut block = SampleBlock::new();
        session.render(&mut block);

        let mut louder = params.clone();
        louder.volume = 100.0;
        session.apply_live(2, louder);
        assert_eq!(session.generation(), 2);
        assert_eq!(session.frequency(), Some(440.0));

        session.set_frequency(600.0);
        let mut panned = session.params().clone();
        panned.pan = 0.5;
        session.apply_live(3, panned);
        assert_eq!(session.frequency(), Some(600.0), "unchanged frequency does not override a sweep");
    }

    #[test]
    fn build_fails_for_bad_binaural() {
        let mut params = ToneParameters::tone(200.0, WaveformKind::Binaural);
        params.binaural_beat_hz = -3.0;
        assert!(PlaybackSession::build(1, params, 44100.0, SessionTimer::default()).is_err());
    }
}
