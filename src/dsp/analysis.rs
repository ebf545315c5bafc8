//! Analysis tap: a read-only copy of the mix bus output for displays.
//!
//! The writer half lives on the render path and never blocks: when the
//! ring is full, samples are dropped. The reader half keeps a sliding
//! window of the most recent samples for waveform, spectrum and meters.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::fmt;

use rtrb::{Consumer, Producer, RingBuffer};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use super::block::SampleBlock;
use super::tuner::{PitchDetector, PitchEstimate};

/// Floor used when converting magnitudes to decibels.
const DB_FLOOR: f32 = -120.0;

/// Create a connected tap pair.
///
/// `capacity` is the ring size in samples; `window` is how many recent
/// samples the reader keeps.
pub fn analysis_tap(capacity: usize, window: usize) -> (TapWriter, AnalysisTap) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    let window = window.max(1);
    (
        TapWriter { producer },
        AnalysisTap {
            consumer,
            window: VecDeque::with_capacity(window),
            window_size: window,
            dropped: 0,
        },
    )
}

/// Render-side half of the tap.
pub struct TapWriter {
    producer: Producer<f32>,
}

impl fmt::Debug for TapWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapWriter")
            .field("free_slots", &self.producer.slots())
            .finish()
    }
}

impl TapWriter {
    /// Push the mono downmix of a block. Drops what does not fit.
    ///
    /// Returns how many samples were written.
    pub fn write_block(&mut self, block: &SampleBlock) -> usize {
        let mut written = 0;
        for (&l, &r) in block.left.iter().zip(block.right.iter()) {
            if self.producer.push((l + r) / 2.0).is_err() {
                break;
            }
            written += 1;
        }
        written
    }

    /// True once the reader half has been dropped.
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

/// Display-side half of the tap.
pub struct AnalysisTap {
    consumer: Consumer<f32>,
    window: VecDeque<f32>,
    window_size: usize,
    dropped: usize,
}

impl AnalysisTap {
    /// Drain everything the render path has written so far into the window.
    /// Returns the number of samples read.
    pub fn poll(&mut self) -> usize {
        let mut read = 0;
        while let Ok(sample) = self.consumer.pop() {
            if self.window.len() == self.window_size {
                self.window.pop_front();
                self.dropped += 1;
            }
            self.window.push_back(sample);
            read += 1;
        }
        read
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Samples that have scrolled out of the window since creation.
    pub fn scrolled_out(&self) -> usize {
        self.dropped
    }

    /// Time-domain window, oldest sample first.
    pub fn waveform(&self) -> Vec<f32> {
        self.window.iter().copied().collect()
    }

    /// Magnitude spectrum of the current window in dBFS, bins 0..=N/2.
    pub fn spectrum(&self) -> Vec<f32> {
        magnitude_spectrum(&self.waveform(), self.window_size)
    }

    pub fn level(&self) -> LevelMeter {
        LevelMeter::measure(self.window.iter().copied())
    }

    /// Run pitch detection over the current window.
    pub fn estimate_pitch(&self, detector: &PitchDetector, sample_rate: u32) -> Option<PitchEstimate> {
        detector.detect(&self.waveform(), sample_rate)
    }
}

/// Blackman-windowed magnitude spectrum in dBFS (a full-scale sine reads ≈ 0 dB).
///
/// `samples` is zero-padded or truncated to `size` points.
pub fn magnitude_spectrum(samples: &[f32], size: usize) -> Vec<f32> {
    if size == 0 {
        return Vec::new();
    }
    let window = blackman(size);
    let coherent_gain: f32 = window.iter().sum::<f32>() / size as f32;

    let mut buffer: Vec<Complex<f32>> = (0..size)
        .map(|i| Complex::new(samples.get(i).copied().unwrap_or(0.0) * window[i], 0.0))
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    planner.plan_fft_forward(size).process(&mut buffer);

    buffer[..=size / 2]
        .iter()
        .map(|c| {
            let amplitude = 2.0 * c.norm() / (size as f32 * coherent_gain);
            if amplitude > 0.0 {
                (20.0 * amplitude.log10()).max(DB_FLOOR)
            } else {
                DB_FLOOR
            }
        })
        .collect()
}

/// Centre frequency of FFT bin `bin` for an FFT of `size` points.
pub fn bin_frequency(bin: usize, size: usize, sample_rate: u32) -> f64 {
    bin as f64 * sample_rate as f64 / size as f64
}

fn blackman(size: usize) -> Vec<f32> {
    if size == 1 {
        return vec![1.0];
    }
    let n = (size - 1) as f32;
    (0..size)
        .map(|i| {
            let x = i as f32 / n;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}

/// Output level summary for a meter display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelMeter {
    pub rms: f32,
    pub peak: f32,
    /// RMS mapped from -60..0 dBFS onto 0..1.
    pub level: f32,
}

impl LevelMeter {
    pub fn measure(samples: impl IntoIterator<Item = f32>) -> Self {
        let (mut sum, mut peak, mut count) = (0.0f64, 0.0f32, 0usize);
        for s in samples {
            sum += (s as f64) * (s as f64);
            peak = peak.max(s.abs());
            count += 1;
        }
        let rms = if count == 0 { 0.0 } else { (sum / count as f64).sqrt() as f32 };
        let level = if rms > 0.0 {
            ((20.0 * rms.log10() + 60.0) / 60.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        LevelMeter { rms, peak, level }
    }
}
