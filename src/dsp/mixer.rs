//! Mix bus: volume, stereo pan and the analysis fan-out.

use std::f64::consts::FRAC_PI_2;

use super::analysis::TapWriter;
use super::block::{BLOCK_SIZE, SampleBlock};
use super::source::{ChannelLayout, SignalSource};

/// Applies gain and pan to a source and hands the result to the sink
/// and, optionally, to an analysis tap.
#[derive(Debug)]
pub struct MixBus {
    gain: f64,
    pan: f64,
    tap: Option<TapWriter>,
}

impl MixBus {
    pub fn new(gain: f64, pan: f64) -> Self {
        MixBus {
            gain: gain.clamp(0.0, 1.0),
            pan: pan.clamp(-1.0, 1.0),
            tap: None,
        }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    pub fn set_pan(&mut self, pan: f64) {
        self.pan = pan.clamp(-1.0, 1.0);
    }

    pub fn attach_tap(&mut self, tap: TapWriter) {
        self.tap = Some(tap);
    }

    pub fn detach_tap(&mut self) -> Option<TapWriter> {
        self.tap.take()
    }

    /// Gain, pan and limit one frame.
    #[inline]
    pub fn mix_frame(&self, frame: (f64, f64), layout: ChannelLayout) -> (f32, f32) {
        let (l, r) = (frame.0 * self.gain, frame.1 * self.gain);
        let (l, r) = match layout {
            ChannelLayout::Mono => {
                let (gl, gr) = mono_pan_gains(self.pan);
                (l * gl, r * gr)
            }
            ChannelLayout::Stereo => stereo_pan(l, r, self.pan),
            ChannelLayout::Dichotic => (l, r),
        };
        (limit(l), limit(r))
    }

    /// Render one block from `source` into `block`, then copy it to the tap.
    pub fn process(&mut self, source: &mut SignalSource, block: &mut SampleBlock) {
        let layout = source.layout();
        for i in 0..BLOCK_SIZE {
            let (l, r) = self.mix_frame(source.next_frame(), layout);
            block.left[i] = l;
            block.right[i] = r;
        }
        if let Some(tap) = self.tap.as_mut() {
            tap.write_block(block);
        }
    }
}

// Pan law: equal-power, as defined for the Web Audio StereoPannerNode.
// A mono signal is spread with x = (pan + 1) / 2, L = cos(x·π/2),
// R = sin(x·π/2), so the centre sits 3 dB down in each ear. A stereo
// signal keeps unity gain at the centre and folds the far channel into
// the near one as the pan moves off centre.

/// Left/right gains for a mono signal at `pan`.
pub fn mono_pan_gains(pan: f64) -> (f64, f64) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) / 2.0;
    ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin())
}

/// Pan a stereo pair.
pub fn stereo_pan(left: f64, right: f64, pan: f64) -> (f64, f64) {
    let pan = pan.clamp(-1.0, 1.0);
    if pan <= 0.0 {
        let x = pan + 1.0;
        let (gl, gr) = ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin());
        (left + right * gl, right * gr)
    } else {
        let (gl, gr) = ((pan * FRAC_PI_2).cos(), (pan * FRAC_PI_2).sin());
        (left * gl, right + left * gr)
    }
}

/// Hard limit to the output range, as the playback device would clip.
#[inline]
fn limit(x: f64) -> f32 {
    x.clamp(-1.0, 1.0) as f32
}
