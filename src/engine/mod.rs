//! Live playback engine.
//!
//! `ToneEngine` moves between `Stopped`, `Building` and `Playing`. While
//! playing it owns exactly one [`PlaybackSession`]; stopping drops it.
//! Hosts change sound through a [`ParameterHandle`], which the render
//! path reads once per block: topology changes rebuild the session,
//! everything else is applied to the running generators.

pub mod handle;
pub mod monitor;
pub mod session;
pub mod timer;

use crate::config::EngineConfig;
use crate::dsp::analysis::{AnalysisTap, TapWriter, analysis_tap};
use crate::dsp::block::{BLOCK_SIZE, SampleBlock};
use crate::dsp::renderer::render_wav;
use crate::dsp::sweep::{SweepController, SweepSettings};
use crate::dsp::tuner::PitchDetector;
use crate::dsp::wav::WavContainer;
use crate::error::ToneError;
use crate::params::{ToneParameters, clamp_frequency};

pub use handle::ParameterHandle;
pub use monitor::{BufferCapture, CaptureSource, PitchMonitor};
pub use session::PlaybackSession;
pub use timer::{SessionTimer, TimerTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    /// A session is being assembled; never observed between calls.
    Building,
    Playing,
}

#[derive(Debug)]
pub struct ToneEngine {
    config: EngineConfig,
    params: ParameterHandle,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    sweep: SweepController,
    /// Tap writer while no session holds it.
    parked_tap: Option<TapWriter>,
    timer_enabled: bool,
    /// Last rendered block and how far into it the host has read.
    carry: SampleBlock,
    cursor: usize,
    /// Frames handed to the host; drives the sweep clock.
    frames_rendered: u64,
    detector: PitchDetector,
}

impl ToneEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ToneError> {
        config.validate()?;
        let detector = PitchDetector::new(config.detector.clone());
        Ok(ToneEngine {
            config,
            params: ParameterHandle::default(),
            state: PlaybackState::Stopped,
            session: None,
            sweep: SweepController::new(),
            parked_tap: None,
            timer_enabled: false,
            carry: SampleBlock::new(),
            cursor: BLOCK_SIZE,
            frames_rendered: 0,
            detector,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn detector(&self) -> &PitchDetector {
        &self.detector
    }

    /// A handle hosts can keep and write from any thread.
    pub fn parameters(&self) -> ParameterHandle {
        self.params.clone()
    }

    pub fn set_parameters(&self, params: ToneParameters) -> Result<(), ToneError> {
        self.params.set(params).map(|_| ())
    }

    /// Seconds of audio rendered since the engine was created.
    pub fn clock(&self) -> f64 {
        self.frames_rendered as f64 / self.config.sample_rate as f64
    }

    /// Frequency the generators are currently producing.
    pub fn current_frequency(&self) -> Option<f64> {
        self.session.as_ref().and_then(PlaybackSession::frequency)
    }

    /// Open a new analysis tap on the mix bus output, replacing any previous one.
    pub fn open_analysis(&mut self) -> AnalysisTap {
        let (writer, reader) = analysis_tap(self.config.tap_capacity, self.config.analysis_window);
        match self.session.as_mut() {
            Some(session) => session.attach_tap(writer),
            None => self.parked_tap = Some(writer),
        }
        reader
    }

    pub fn start(&mut self) -> Result<(), ToneError> {
        if self.is_playing() {
            return Ok(());
        }
        self.state = PlaybackState::Building;
        let (generation, params) = self.params.snapshot();
        let mut timer = SessionTimer::new(self.config.session_secs);
        if self.timer_enabled {
            timer.start();
        }

        let mut session = match PlaybackSession::build(generation, params, self.config.sample_rate as f64, timer) {
            Ok(session) => session,
            Err(e) => {
                self.state = PlaybackState::Stopped;
                log::warn!("failed to start playback: {e}");
                return Err(e);
            }
        };
        if let Some(tap) = self.parked_tap.take() {
            session.attach_tap(tap);
        }
        self.cursor = BLOCK_SIZE;
        if let Some(freq) = self.sweep.begin(self.clock()) {
            session.set_frequency(freq);
            log::debug!("armed sweep started at {freq} Hz");
        }

        log::info!(
            "playback started: {} at {} Hz",
            session.params().waveform,
            session.params().frequency
        );
        self.session = Some(session);
        self.state = PlaybackState::Playing;
        Ok(())
    }

    /// Stop playback and release every generator. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Some(tap) = session.detach_tap() {
                self.parked_tap = Some(tap);
            }
            log::info!(
                "playback stopped, {} generators released",
                session.source().generator_count()
            );
        }
        self.sweep.halt();
        self.cursor = BLOCK_SIZE;
        self.state = PlaybackState::Stopped;
    }

    /// Render the next `BLOCK_SIZE` frames. Silence while stopped.
    pub fn render_block(&mut self, block: &mut SampleBlock) {
        self.pull(BLOCK_SIZE, |i, l, r| {
            block.left[i] = l;
            block.right[i] = r;
        });
    }

    /// Fill an interleaved stereo buffer of any length, as an audio
    /// callback would. Returns the number of frames written.
    ///
    /// Frames left over from a partly read block are served first, so
    /// consecutive calls form one continuous signal.
    pub fn render_interleaved(&mut self, out: &mut [f32]) -> usize {
        let frames = out.len() / 2;
        self.pull(frames, |i, l, r| {
            out[2 * i] = l;
            out[2 * i + 1] = r;
        });
        frames
    }

    /// Hand `frames` frames to `write`, rendering blocks as the carried one runs out.
    fn pull(&mut self, frames: usize, mut write: impl FnMut(usize, f32, f32)) {
        let mut done = 0;
        while done < frames {
            if self.cursor == BLOCK_SIZE {
                self.render_carry();
            }
            let n = (BLOCK_SIZE - self.cursor).min(frames - done);
            for i in 0..n {
                write(done + i, self.carry.left[self.cursor + i], self.carry.right[self.cursor + i]);
            }
            self.cursor += n;
            done += n;
            self.frames_rendered += n as u64;
        }
    }

    fn render_carry(&mut self) {
        self.sync_parameters();
        match self.session.as_mut() {
            Some(session) => session.render(&mut self.carry),
            None => {
                self.carry.clear();
                if let Some(tap) = self.parked_tap.as_mut() {
                    tap.write_block(&self.carry);
                }
            }
        }
        self.cursor = 0;
    }

    fn sync_parameters(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let (generation, params) = self.params.snapshot();
        if generation == session.generation() {
            return;
        }
        if session.params().needs_rebuild(&params) {
            self.rebuild(generation, params);
        } else {
            session.apply_live(generation, params);
        }
    }

    fn rebuild(&mut self, generation: u64, params: ToneParameters) {
        let Some(mut old) = self.session.take() else {
            return;
        };
        self.state = PlaybackState::Building;
        let tap = old.detach_tap();
        let timer = old.timer().clone();
        let swept = if self.sweep.is_sweeping() { old.frequency() } else { None };
        let (from, to) = (old.params().waveform, params.waveform);
        drop(old);

        match PlaybackSession::build(generation, params, self.config.sample_rate as f64, timer) {
            Ok(mut session) => {
                if let Some(tap) = tap {
                    session.attach_tap(tap);
                }
                if let Some(freq) = swept {
                    session.set_frequency(freq);
                }
                log::info!("rebuilt playback graph: {from} -> {to}");
                self.session = Some(session);
                self.state = PlaybackState::Playing;
            }
            Err(e) => {
                log::warn!("rebuild failed, playback stopped: {e}");
                self.parked_tap = tap;
                self.sweep.halt();
                self.state = PlaybackState::Stopped;
            }
        }
    }

    /// Enable a sweep. Starts now when playing, otherwise with the next start.
    pub fn enable_sweep(&mut self, settings: SweepSettings) -> Result<(), ToneError> {
        self.sweep.enable(settings, self.is_playing(), self.clock())?;
        log::info!(
            "sweep enabled: {} -> {} Hz over {} s ({:?})",
            settings.start_hz,
            settings.end_hz,
            settings.duration_secs,
            settings.kind
        );
        self.tick_sweep();
        Ok(())
    }

    pub fn disable_sweep(&mut self) {
        if self.sweep.is_enabled() {
            log::info!("sweep disabled");
        }
        self.sweep.disable();
    }

    pub fn sweep(&self) -> &SweepController {
        &self.sweep
    }

    /// Advance a running sweep to the engine clock.
    pub fn tick_sweep(&mut self) -> Option<f64> {
        let freq = clamp_frequency(self.sweep.tick(self.clock())?);
        if let Some(session) = self.session.as_mut() {
            session.set_frequency(freq);
        }
        Some(freq)
    }

    /// Whether the next start runs the countdown.
    pub fn set_timer_enabled(&mut self, enabled: bool) {
        self.timer_enabled = enabled;
        if let Some(session) = self.session.as_mut() {
            let timer = session.timer_mut();
            match (enabled, timer.is_running()) {
                (true, false) => timer.start(),
                (false, true) => timer.clear(),
                _ => {}
            }
        }
    }

    pub fn set_timer_duration(&mut self, secs: u64) {
        self.config.session_secs = secs;
    }

    pub fn timer_remaining(&self) -> Option<u64> {
        self.session.as_ref().and_then(|s| s.timer().remaining())
    }

    /// One-second countdown tick. Stops playback on expiry.
    pub fn tick_timer(&mut self) -> TimerTick {
        let Some(session) = self.session.as_mut() else {
            return TimerTick::Inactive;
        };
        let tick = session.timer_mut().tick();
        if tick == TimerTick::Expired {
            log::info!("session timer expired");
            self.timer_enabled = false;
            self.stop();
        }
        tick
    }

    /// Render the current parameters to a WAV image. Playback is untouched.
    pub fn export(&self, duration_secs: Option<f64>) -> Result<WavContainer, ToneError> {
        let duration = duration_secs.unwrap_or(self.config.export.default_duration_secs);
        render_wav(&self.params.get(), duration, self.config.sample_rate, &self.config.export)
    }
}

impl Default for ToneEngine {
    fn default() -> Self {
        ToneEngine {
            config: EngineConfig::default(),
            params: ParameterHandle::default(),
            state: PlaybackState::Stopped,
            session: None,
            sweep: SweepController::new(),
            parked_tap: None,
            timer_enabled: false,
            carry: SampleBlock::new(),
            cursor: BLOCK_SIZE,
            frames_rendered: 0,
            detector: PitchDetector::default(),
        }
    }
}
