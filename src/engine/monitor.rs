//! Pitch monitoring of a captured input signal.
//!
//! The capture device is abstracted behind [`CaptureSource`] so hosts can
//! plug in whatever input they have; [`BufferCapture`] replays a buffer.

use std::collections::VecDeque;

use crate::dsp::tuner::{PitchDetector, PitchEstimate};
use crate::error::ToneError;

/// A mono input stream.
pub trait CaptureSource: Send {
    /// Acquire the device. Returns its sample rate.
    fn open(&mut self) -> Result<u32, ToneError>;

    /// Copy available samples into `buf`, returning how many were written.
    /// Zero means nothing is ready yet.
    fn read(&mut self, buf: &mut [f32]) -> usize;

    /// Release the device. Must tolerate repeated calls.
    fn close(&mut self);
}

/// Replays an in-memory buffer as a capture device.
#[derive(Debug, Clone)]
pub struct BufferCapture {
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
    looping: bool,
    open: bool,
    unavailable: Option<String>,
}

impl BufferCapture {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        BufferCapture {
            samples,
            sample_rate,
            position: 0,
            looping: false,
            open: false,
            unavailable: None,
        }
    }

    /// Replay the buffer endlessly.
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// A device that refuses to open, e.g. because permission was denied.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        BufferCapture {
            unavailable: Some(reason.into()),
            ..BufferCapture::new(Vec::new(), 0)
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl CaptureSource for BufferCapture {
    fn open(&mut self) -> Result<u32, ToneError> {
        if let Some(reason) = &self.unavailable {
            return Err(ToneError::ResourceUnavailable(reason.clone()));
        }
        if self.sample_rate == 0 {
            return Err(ToneError::ResourceUnavailable("capture has no sample rate".into()));
        }
        self.open = true;
        Ok(self.sample_rate)
    }

    fn read(&mut self, buf: &mut [f32]) -> usize {
        if !self.open || self.samples.is_empty() {
            return 0;
        }
        let mut written = 0;
        while written < buf.len() {
            if self.position == self.samples.len() {
                if !self.looping {
                    break;
                }
                self.position = 0;
            }
            let n = (buf.len() - written).min(self.samples.len() - self.position);
            buf[written..written + n].copy_from_slice(&self.samples[self.position..self.position + n]);
            written += n;
            self.position += n;
        }
        written
    }

    fn close(&mut self) {
        self.open = false;
    }
}

/// Runs captured audio through a [`PitchDetector`].
pub struct PitchMonitor {
    detector: PitchDetector,
    window: VecDeque<f32>,
    window_size: usize,
    scratch: Vec<f32>,
    capture: Option<(Box<dyn CaptureSource>, u32)>,
}

impl std::fmt::Debug for PitchMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PitchMonitor")
            .field("window_size", &self.window_size)
            .field("running", &self.is_running())
            .finish()
    }
}

impl PitchMonitor {
    pub fn new(detector: PitchDetector, window_size: usize) -> Self {
        let window_size = window_size.max(1);
        PitchMonitor {
            detector,
            window: VecDeque::with_capacity(window_size),
            window_size,
            scratch: vec![0.0; window_size],
            capture: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.capture.is_some()
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.capture.as_ref().map(|(_, sr)| *sr)
    }

    /// Start monitoring `capture`, replacing any running capture.
    ///
    /// If the device cannot be opened the monitor keeps whatever it was
    /// doing before.
    pub fn start(&mut self, mut capture: Box<dyn CaptureSource>) -> Result<(), ToneError> {
        let sample_rate = match capture.open() {
            Ok(sr) => sr,
            Err(e) => {
                log::warn!("capture unavailable: {e}");
                return Err(e);
            }
        };
        self.stop();
        log::info!("pitch monitor started at {sample_rate} Hz");
        self.capture = Some((capture, sample_rate));
        Ok(())
    }

    /// Release the capture device. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some((mut capture, _)) = self.capture.take() {
            capture.close();
            log::info!("pitch monitor stopped");
        }
        self.window.clear();
    }

    /// Pull pending input and, once a full window is buffered, run detection.
    ///
    /// Returns the estimate for this tick; `None` is a miss or not enough input.
    pub fn poll(&mut self) -> Option<PitchEstimate> {
        let (capture, sample_rate) = self.capture.as_mut()?;
        let sample_rate = *sample_rate;
        loop {
            let n = capture.read(&mut self.scratch);
            if n == 0 {
                break;
            }
            for &s in &self.scratch[..n] {
                if self.window.len() == self.window_size {
                    self.window.pop_front();
                }
                self.window.push_back(s);
            }
            if n < self.scratch.len() {
                break;
            }
            if self.window.len() == self.window_size {
                break;
            }
        }
        if self.window.len() < self.window_size {
            return None;
        }
        let window: Vec<f32> = self.window.iter().copied().collect();
        self.detector.detect(&window, sample_rate)
    }
}
