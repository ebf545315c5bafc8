pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod hearing;
pub mod notes;
pub mod params;
pub mod preset;
pub mod tasks;

pub use crate::config::EngineConfig;
pub use crate::engine::{PlaybackState, ToneEngine};
pub use crate::error::ToneError;
pub use crate::params::{ToneParameters, WaveformKind};

use crate::config::ExportConfig;
use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the tonegen-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn params_from_js(params: JsValue) -> Result<ToneParameters, JsValue> {
    serde_wasm_bindgen::from_value(params).map_err(|e| JsValue::from_str(&format!("{e}")))
}

/// WASM-exposed: render tone parameters to a WAV byte array.
#[wasm_bindgen]
pub fn render_tone_wav(params: JsValue, duration_secs: f64, sample_rate: u32) -> Result<Vec<u8>, JsValue> {
    let params = params_from_js(params)?;
    let wav = dsp::renderer::render_wav(&params, duration_secs, sample_rate, &ExportConfig::default())
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(wav.into_bytes())
}

/// WASM-exposed: render tone parameters to interleaved stereo f32 samples.
/// Returns the raw audio buffer for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_tone_samples(params: JsValue, duration_secs: f64, sample_rate: u32) -> Result<Vec<f32>, JsValue> {
    let params = params_from_js(params)?;
    let rendered = dsp::renderer::render_tone(&params, duration_secs, sample_rate, &ExportConfig::default())
        .map_err(|e| JsValue::from_str(&format!("{e}")))?;
    Ok(rendered.interleaved())
}

/// WASM-exposed: detect the fundamental of a mono buffer.
/// Returns `{ frequency, confidence, midiNote, cents, note }` or `null` on a miss.
#[wasm_bindgen]
pub fn detect_pitch(samples: &[f32], sample_rate: u32) -> Result<JsValue, JsValue> {
    let detector = dsp::tuner::PitchDetector::default();
    match detector.detect(samples, sample_rate) {
        Some(estimate) => {
            let report = PitchReport {
                frequency: estimate.frequency,
                confidence: estimate.confidence,
                midi_note: estimate.midi_note,
                cents: estimate.cents,
                note: notes::closest_note_name(estimate.frequency),
            };
            serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&format!("{e}")))
        }
        None => Ok(JsValue::NULL),
    }
}

/// WASM-exposed: name of the note nearest to `frequency`, e.g. "A4".
#[wasm_bindgen]
pub fn closest_note(frequency: f64) -> Option<String> {
    notes::closest_note_name(frequency)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PitchReport {
    frequency: f64,
    confidence: f64,
    midi_note: u8,
    cents: f64,
    note: Option<String>,
}
