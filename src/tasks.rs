//! Cancellable fixed-cadence background loops.
//!
//! Each loop runs on its own thread and sleeps in `recv_timeout` on a stop
//! channel, so cancelling wakes it immediately instead of after the next
//! interval. A dropped sender counts as a stop. Loops are independent;
//! nothing orders one against another.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};

use crate::dsp::analysis::{AnalysisTap, LevelMeter};
use crate::dsp::tuner::{PitchDetector, PitchEstimate};
use crate::engine::{PitchMonitor, TimerTick, ToneEngine};
use crate::error::ToneError;

/// An engine shared between the audio callback and the periodic tasks.
pub type SharedEngine = Arc<Mutex<ToneEngine>>;

pub fn lock_engine(engine: &SharedEngine) -> MutexGuard<'_, ToneEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A named loop calling `tick` every `interval` until cancelled or the
/// tick returns `ControlFlow::Break`.
#[derive(Debug)]
pub struct PeriodicTask {
    name: String,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> Result<Self, ToneError>
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if tick().is_break() {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| ToneError::ResourceUnavailable(format!("cannot spawn {name} task: {e}")))?;
        log::debug!("{name} task started, every {interval:?}");
        Ok(PeriodicTask {
            name: name.to_string(),
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel and wait for the loop to exit. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The loop may already have exited on its own.
            stop.send(()).ok();
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("{} task panicked", self.name);
            } else {
                log::debug!("{} task stopped", self.name);
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Advance the engine's sweep at the configured cadence.
pub fn spawn_sweep_task(engine: &SharedEngine) -> Result<PeriodicTask, ToneError> {
    let interval = lock_engine(engine).config().sweep_interval();
    let engine = Arc::clone(engine);
    PeriodicTask::spawn("sweep", interval, move || {
        lock_engine(&engine).tick_sweep();
        ControlFlow::Continue(())
    })
}

/// Count the session timer down. Exits after the timer stops playback.
pub fn spawn_timer_task(engine: &SharedEngine) -> Result<PeriodicTask, ToneError> {
    let interval = lock_engine(engine).config().timer_interval();
    let engine = Arc::clone(engine);
    PeriodicTask::spawn("session-timer", interval, move || match lock_engine(&engine).tick_timer() {
        TimerTick::Expired => ControlFlow::Break(()),
        TimerTick::Running(_) | TimerTick::Inactive => ControlFlow::Continue(()),
    })
}

/// What a display refresh gets to draw.
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub waveform: Vec<f32>,
    pub spectrum: Vec<f32>,
    pub level: LevelMeter,
    pub pitch: Option<PitchEstimate>,
}

/// Refresh displays from the analysis tap at the display cadence.
pub fn spawn_display_task<F>(
    mut tap: AnalysisTap,
    detector: PitchDetector,
    sample_rate: u32,
    interval: Duration,
    mut on_frame: F,
) -> Result<PeriodicTask, ToneError>
where
    F: FnMut(DisplayFrame) + Send + 'static,
{
    PeriodicTask::spawn("display", interval, move || {
        tap.poll();
        on_frame(DisplayFrame {
            waveform: tap.waveform(),
            spectrum: tap.spectrum(),
            level: tap.level(),
            pitch: tap.estimate_pitch(&detector, sample_rate),
        });
        ControlFlow::Continue(())
    })
}

/// Poll a pitch monitor and report each tick's estimate.
pub fn spawn_monitor_task<F>(
    monitor: Arc<Mutex<PitchMonitor>>,
    interval: Duration,
    mut on_estimate: F,
) -> Result<PeriodicTask, ToneError>
where
    F: FnMut(Option<PitchEstimate>) + Send + 'static,
{
    PeriodicTask::spawn("pitch-monitor", interval, move || {
        let mut monitor = monitor.lock().unwrap_or_else(PoisonError::into_inner);
        if !monitor.is_running() {
            return ControlFlow::Break(());
        }
        on_estimate(monitor.poll());
        ControlFlow::Continue(())
    })
}
