//! Offline renderer: renders tone parameters to PCM buffers and WAV files.

use crate::config::ExportConfig;
use crate::error::ToneError;
use crate::params::ToneParameters;

use super::block::{BLOCK_SIZE, SampleBlock};
use super::mixer::MixBus;
use super::source::{NoiseSeed, SignalSource};
use super::wav::{WavContainer, encode_wav};

/// Planar stereo output of an offline render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedBuffer {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl RenderedBuffer {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Interleaved L/R samples.
    pub fn interleaved(&self) -> Vec<f32> {
        let frames = self.frames();
        let mut out = Vec::with_capacity(frames * self.channels.len());
        for i in 0..frames {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }

    pub fn to_wav(&self) -> Result<WavContainer, ToneError> {
        encode_wav(&self.channels, self.sample_rate)
    }
}

/// Render `params` for `duration_secs` through a fresh source graph.
///
/// Generators start at phase zero and noise uses the configured seed, so
/// identical inputs give identical buffers.
pub fn render_tone(
    params: &ToneParameters,
    duration_secs: f64,
    sample_rate: u32,
    export: &ExportConfig,
) -> Result<RenderedBuffer, ToneError> {
    let duration_secs = export.check_duration(duration_secs)?;
    if sample_rate == 0 {
        return Err(ToneError::invalid("sample_rate", "must be positive"));
    }
    let params = params.clone().sanitized()?;

    let total_frames = (duration_secs * sample_rate as f64).round() as usize;
    if total_frames == 0 {
        return Err(ToneError::RenderFailure("render produced no frames".into()));
    }

    let mut source = SignalSource::build(&params, sample_rate as f64, NoiseSeed::Fixed(export.noise_seed))?;
    let mut bus = MixBus::new(params.gain(), params.pan);
    let mut left = Vec::with_capacity(total_frames);
    let mut right = Vec::with_capacity(total_frames);
    let mut block = SampleBlock::new();

    while left.len() < total_frames {
        bus.process(&mut source, &mut block);
        let take = (total_frames - left.len()).min(BLOCK_SIZE);
        left.extend_from_slice(&block.left[..take]);
        right.extend_from_slice(&block.right[..take]);
    }

    log::debug!(
        "rendered {} frames of {} at {} Hz",
        total_frames,
        params.waveform,
        sample_rate
    );

    Ok(RenderedBuffer {
        channels: vec![left, right],
        sample_rate,
    })
}

/// Render and encode in one step.
pub fn render_wav(
    params: &ToneParameters,
    duration_secs: f64,
    sample_rate: u32,
    export: &ExportConfig,
) -> Result<WavContainer, ToneError> {
    let rendered = render_tone(params, duration_secs, sample_rate, export)?;
    let wav = rendered.to_wav()?;
    log::info!("exported {:.1} s {} tone ({} bytes)", duration_secs, params.waveform, wav.len());
    Ok(wav)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveformKind;

    #[test]
    fn render_length_and_range() {
        let params = ToneParameters::tone(440.0, WaveformKind::Square);
        let out = render_tone(&params, 1.0, 44100, &ExportConfig::default()).unwrap();
        assert_eq!(out.channels.len(), 2);
        assert_eq!(out.frames(), 44100);
        assert!((out.duration_secs() - 1.0).abs() < 1e-9);
        assert!(out.channels.iter().flatten().all(|s| (-1.0..=1.0).contains(s)));
        assert_eq!(out.interleaved().len(), 88200);
    }

    #[test]
    fn renders_are_deterministic() {
        let export = ExportConfig::default();
        for kind in WaveformKind::ALL {
            let mut params = ToneParameters::tone(330.0, kind);
            params.harmonics.set(2, 40.0);
            params.pan = -0.3;
            let a = render_tone(&params, 1.0, 22050, &export).unwrap();
            let b = render_tone(&params, 1.0, 22050, &export).unwrap();
            assert_eq!(a, b, "{kind} should render identically");
        }
    }

    #[test]
    fn noise_seed_changes_output() {
        let params = ToneParameters::tone(0.0, WaveformKind::NoisePink);
        let a = render_tone(&params, 1.0, 8000, &ExportConfig::default()).unwrap();
        let other = ExportConfig {
            noise_seed: 99,
            ..Default::default()
        };
        let b = render_tone(&params, 1.0, 8000, &other).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn starts_at_phase_zero() {
        let params = ToneParameters::tone(1000.0, WaveformKind::Sine);
        let out = render_tone(&params, 1.0, 44100, &ExportConfig::default()).unwrap();
        assert_eq!(out.channels[0][0], 0.0);
        assert_eq!(out.channels[1][0], 0.0);
    }

    #[test]
    fn binaural_keeps_channels_apart() {
        let mut params = ToneParameters::tone(200.0, WaveformKind::Binaural);
        params.binaural_beat_hz = 10.0;
        params.volume = 100.0;
        let out = render_tone(&params, 1.0, 44100, &ExportConfig::default()).unwrap();
        assert_ne!(out.channels[0], out.channels[1]);
    }

    #[test]
    fn duration_bounds() {
        let params = ToneParameters::default();
        let export = ExportConfig::default();
        assert!(matches!(
            render_tone(&params, 0.5, 44100, &export),
            Err(ToneError::InvalidParameter { field: "duration_secs", .. })
        ));
        assert!(render_tone(&params, 30.5, 44100, &export).is_err());
        assert!(render_tone(&params, 2.0, 0, &export).is_err());
    }

    #[test]
    fn wav_size_matches_duration() {
        let wav = render_wav(&ToneParameters::default(), 1.0, 44100, &ExportConfig::default()).unwrap();
        assert_eq!(wav.len(), 44 + 44100 * 4);
        assert_eq!(wav.channels, 2);
    }
}
