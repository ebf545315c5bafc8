//! RIFF/WAVE encoding, 16-bit PCM.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ToneError;

pub const HEADER_LEN: usize = 44;
pub const BITS_PER_SAMPLE: u16 = 16;

/// An encoded WAV file: parsed header fields plus the complete byte image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub data_size: u32,
    bytes: Vec<u8>,
}

impl WavContainer {
    /// Size of the RIFF chunk as written in the header (`36 + data_size`).
    pub fn riff_size(&self) -> u32 {
        36 + self.data_size
    }

    pub fn frames(&self) -> usize {
        self.data_size as usize / self.block_align as usize
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// PCM payload following the header.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }
}

/// Quantize one float sample to 16-bit PCM.
///
/// Positive values scale by 32767, negative by 32768, so both rails map
/// exactly. The product is truncated toward zero.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let s = if sample.is_nan() { 0.0 } else { sample.clamp(-1.0, 1.0) };
    if s < 0.0 { (s * 32768.0) as i16 } else { (s * 32767.0) as i16 }
}

/// Encode planar channels into an interleaved 16-bit WAV.
///
/// Every channel must have the same, non-zero length.
pub fn encode_wav(channels: &[Vec<f32>], sample_rate: u32) -> Result<WavContainer, ToneError> {
    if channels.is_empty() {
        return Err(ToneError::RenderFailure("no channels to encode".into()));
    }
    let frames = channels[0].len();
    if frames == 0 {
        return Err(ToneError::RenderFailure("zero-length buffer".into()));
    }
    if let Some((i, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != frames) {
        return Err(ToneError::RenderFailure(format!(
            "channel {i} has {} frames, expected {frames}",
            ch.len()
        )));
    }
    if sample_rate == 0 {
        return Err(ToneError::RenderFailure("sample rate is zero".into()));
    }

    let channel_count = u16::try_from(channels.len())
        .map_err(|_| ToneError::RenderFailure(format!("{} channels is too many", channels.len())))?;
    let block_align = channel_count * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| ToneError::RenderFailure("byte rate overflows".into()))?;
    let data_size = u32::try_from(frames * block_align as usize)
        .ok()
        .filter(|&size| size <= u32::MAX - 36)
        .ok_or_else(|| ToneError::RenderFailure("payload too large for RIFF".into()))?;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(HEADER_LEN + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&channel_count.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for frame in 0..frames {
        for ch in channels {
            buf.extend_from_slice(&quantize(ch[frame]).to_le_bytes());
        }
    }

    Ok(WavContainer {
        channels: channel_count,
        sample_rate,
        byte_rate,
        block_align,
        data_size,
        bytes: buf,
    })
}

/// Write an encoded container to `path`.
///
/// The bytes go to a sibling temporary file that is renamed over `path`
/// once complete, so a failed write never leaves a truncated WAV behind.
pub fn write_wav_file(path: impl AsRef<Path>, wav: &WavContainer) -> Result<(), ToneError> {
    let path = path.as_ref();
    let tmp = partial_path(path);
    let result = fs::write(&tmp, wav.as_bytes()).and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = result {
        fs::remove_file(&tmp).ok();
        log::warn!("failed to write {}: {e}", path.display());
        return Err(e.into());
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("export.wav"));
    name.push(".part");
    path.with_file_name(name)
}
