//! Frequency sweeps.
//!
//! A sweep moves the base frequency from `start_hz` to `end_hz` over
//! `duration_secs`, then jumps back to `start_hz` and repeats until it is
//! disabled. Time is whatever clock the caller passes in; the engine uses
//! its render clock.

use serde::{Deserialize, Serialize};

use crate::error::ToneError;
use crate::params::{MAX_FREQUENCY, MIN_FREQUENCY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepKind {
    #[default]
    Linear,
    Logarithmic,
}

/// Validated sweep shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    pub start_hz: f64,
    pub end_hz: f64,
    pub duration_secs: f64,
    pub kind: SweepKind,
}

impl Default for SweepSettings {
    fn default() -> Self {
        SweepSettings {
            start_hz: 20.0,
            end_hz: 20_000.0,
            duration_secs: 10.0,
            kind: SweepKind::Logarithmic,
        }
    }
}

impl SweepSettings {
    pub fn new(start_hz: f64, end_hz: f64, duration_secs: f64, kind: SweepKind) -> Result<Self, ToneError> {
        let settings = SweepSettings {
            start_hz,
            end_hz,
            duration_secs,
            kind,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ToneError> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(ToneError::invalid("duration_secs", "sweep duration must be positive"));
        }
        for (field, hz) in [("start_hz", self.start_hz), ("end_hz", self.end_hz)] {
            if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&hz) {
                return Err(ToneError::invalid(
                    field,
                    format!("sweep bound {hz} Hz outside [{MIN_FREQUENCY}, {MAX_FREQUENCY}]"),
                ));
            }
        }
        Ok(())
    }

    /// Frequency at `progress` in [0, 1].
    pub fn frequency_at(&self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self.kind {
            SweepKind::Linear => self.start_hz + (self.end_hz - self.start_hz) * p,
            SweepKind::Logarithmic => self.start_hz * (self.end_hz / self.start_hz).powf(p),
        }
    }
}

/// A running sweep cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepState {
    pub settings: SweepSettings,
    /// Clock time, in seconds, at which the current cycle began.
    pub cycle_start: f64,
    /// Completed cycles since the sweep began.
    pub cycles: u64,
}

impl SweepState {
    pub fn new(settings: SweepSettings, now: f64) -> Self {
        SweepState {
            settings,
            cycle_start: now,
            cycles: 0,
        }
    }

    /// Advance to `now` and return the frequency to apply.
    ///
    /// Once the cycle completes the cycle restarts at `now` and the start
    /// frequency is returned.
    pub fn advance(&mut self, now: f64) -> f64 {
        let elapsed = (now - self.cycle_start).max(0.0);
        let progress = (elapsed / self.settings.duration_secs).clamp(0.0, 1.0);
        if progress >= 1.0 {
            self.cycle_start = now;
            self.cycles += 1;
            log::debug!("sweep cycle {} complete, restarting at {} Hz", self.cycles, self.settings.start_hz);
            return self.settings.start_hz;
        }
        self.settings.frequency_at(progress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepPhase {
    Idle,
    Sweeping(SweepState),
}

/// `Idle → Sweeping → Idle`, driven by enable/disable and ticks.
///
/// Enabling while nothing plays only arms the sweep; the owner calls
/// [`SweepController::begin`] when playback starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepController {
    armed: Option<SweepSettings>,
    phase: SweepPhase,
}

impl Default for SweepController {
    fn default() -> Self {
        SweepController {
            armed: None,
            phase: SweepPhase::Idle,
        }
    }
}

impl SweepController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &SweepPhase {
        &self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.armed.is_some()
    }

    pub fn is_sweeping(&self) -> bool {
        matches!(self.phase, SweepPhase::Sweeping(_))
    }

    pub fn settings(&self) -> Option<&SweepSettings> {
        self.armed.as_ref()
    }

    /// Enable a sweep. Starts immediately when `playing`, otherwise arms it.
    pub fn enable(&mut self, settings: SweepSettings, playing: bool, now: f64) -> Result<(), ToneError> {
        settings.validate()?;
        self.armed = Some(settings);
        self.phase = if playing {
            SweepPhase::Sweeping(SweepState::new(settings, now))
        } else {
            SweepPhase::Idle
        };
        Ok(())
    }

    /// Start the armed sweep, if any, at `now`.
    pub fn begin(&mut self, now: f64) -> Option<f64> {
        let settings = self.armed?;
        self.phase = SweepPhase::Sweeping(SweepState::new(settings, now));
        Some(settings.start_hz)
    }

    /// Playback stopped: go idle but stay armed.
    pub fn halt(&mut self) {
        self.phase = SweepPhase::Idle;
    }

    pub fn disable(&mut self) {
        self.armed = None;
        self.phase = SweepPhase::Idle;
    }

    /// Frequency for this tick, or `None` when idle.
    pub fn tick(&mut self, now: f64) -> Option<f64> {
        match &mut self.phase {
            SweepPhase::Idle => None,
            SweepPhase::Sweeping(state) => Some(state.advance(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> SweepSettings {
        SweepSettings::new(100.0, 1000.0, 5.0, SweepKind::Linear).unwrap()
    }

    #[test]
    fn linear_midpoint() {
        let mut state = SweepState::new(linear(), 0.0);
        assert_eq!(state.advance(0.0), 100.0);
        assert!((state.advance(2.5) - 550.0).abs() < 1e-9);
    }

    #[test]
    fn cycle_resets_at_duration() {
        let mut state = SweepState::new(linear(), 0.0);
        assert_eq!(state.advance(5.0), 100.0, "frequency returns to start");
        assert_eq!(state.cycle_start, 5.0);
        assert_eq!(state.cycles, 1);
        assert!((state.advance(7.5) - 550.0).abs() < 1e-9, "second cycle follows the same curve");
    }

    #[test]
    fn logarithmic_midpoint() {
        let settings = SweepSettings::new(100.0, 1000.0, 5.0, SweepKind::Logarithmic).unwrap();
        let mut state = SweepState::new(settings, 0.0);
        let f = state.advance(2.5);
        assert!((f - 316.227766).abs() < 0.01, "expected ~316.2 Hz, got {f}");
    }

    #[test]
    fn constant_when_start_equals_end() {
        for kind in [SweepKind::Linear, SweepKind::Logarithmic] {
            let settings = SweepSettings::new(440.0, 440.0, 2.0, kind).unwrap();
            for t in [0.0, 0.5, 1.0, 1.99] {
                assert!((settings.frequency_at(t / 2.0) - 440.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn rejects_bad_settings() {
        assert!(SweepSettings::new(0.0, 1000.0, 5.0, SweepKind::Logarithmic).is_err());
        assert!(SweepSettings::new(-5.0, 1000.0, 5.0, SweepKind::Logarithmic).is_err());
        assert!(SweepSettings::new(100.0, 1000.0, 0.0, SweepKind::Linear).is_err());
        assert!(SweepSettings::new(100.0, 1000.0, -1.0, SweepKind::Linear).is_err());
        assert!(SweepSettings::new(0.0, 1000.0, 5.0, SweepKind::Linear).is_err());
        assert!(SweepSettings::new(-1000.0, 500.0, 5.0, SweepKind::Linear).is_err());
        assert!(SweepSettings::new(100.0, 50_000.0, 5.0, SweepKind::Linear).is_err());
        assert!(SweepSettings::new(f64::NAN, 1000.0, 5.0, SweepKind::Linear).is_err());
        assert!(SweepSettings::new(0.1, 20_000.0, 5.0, SweepKind::Linear).is_ok());
    }

    #[test]
    fn controller_arms_when_stopped() {
        let mut ctl = SweepController::new();
        ctl.enable(linear(), false, 0.0).unwrap();
        assert!(ctl.is_enabled());
        assert!(!ctl.is_sweeping());
        assert_eq!(ctl.tick(1.0), None);

        assert_eq!(ctl.begin(10.0), Some(100.0));
        assert!((ctl.tick(12.5).unwrap() - 550.0).abs() < 1e-9);

        ctl.halt();
        assert!(ctl.is_enabled() && !ctl.is_sweeping());
        ctl.disable();
        assert_eq!(ctl.begin(0.0), None);
    }

    #[test]
    fn controller_sweeps_when_playing() {
        let mut ctl = SweepController::new();
        ctl.enable(linear(), true, 1.0).unwrap();
        assert!(ctl.is_sweeping());
        assert!((ctl.tick(3.5).unwrap() - 550.0).abs() < 1e-9);
        ctl.disable();
        assert_eq!(ctl.tick(4.0), None);
    }

    #[test]
    fn failed_enable_keeps_previous_sweep() {
        let mut ctl = SweepController::new();
        ctl.enable(linear(), true, 0.0).unwrap();
        let bad = SweepSettings {
            duration_secs: 0.0,
            ..linear()
        };
        assert!(ctl.enable(bad, true, 0.0).is_err());
        assert_eq!(ctl.settings(), Some(&linear()));
    }
}
