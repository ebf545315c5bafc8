//! Engine configuration.
//!
//! Every field has a default, so hosts only spell out what they change:
//!
//! ```
//! let config = tonegen_core::EngineConfig::from_json(r#"{"sampleRate": 48000}"#).unwrap();
//! assert_eq!(config.sample_rate, 48000);
//! assert_eq!(config.analysis_window, 2048);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dsp::tuner::DetectorConfig;
use crate::error::ToneError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Ring size, in samples, between the render path and the analysis tap.
    pub tap_capacity: usize,
    /// Samples kept for waveform, spectrum and pitch displays.
    pub analysis_window: usize,
    pub display_interval_ms: u64,
    pub sweep_interval_ms: u64,
    pub timer_interval_ms: u64,
    /// Session countdown length in seconds.
    pub session_secs: u64,
    pub detector: DetectorConfig,
    pub export: ExportConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tap_capacity: 8192,
            analysis_window: 2048,
            display_interval_ms: 16,
            sweep_interval_ms: 33,
            timer_interval_ms: 1000,
            session_secs: 300,
            detector: DetectorConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ToneError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ToneError> {
        if self.sample_rate == 0 {
            return Err(ToneError::invalid("sample_rate", "must be positive"));
        }
        if self.analysis_window < 2 * self.detector.min_lag.max(1) {
            return Err(ToneError::invalid(
                "analysis_window",
                format!("must hold at least two minimum lags ({})", 2 * self.detector.min_lag),
            ));
        }
        for (field, ms) in [
            ("display_interval_ms", self.display_interval_ms),
            ("sweep_interval_ms", self.sweep_interval_ms),
            ("timer_interval_ms", self.timer_interval_ms),
        ] {
            if ms == 0 {
                return Err(ToneError::invalid(field, "interval must be positive"));
            }
        }
        self.export.validate()
    }

    pub fn display_interval(&self) -> Duration {
        Duration::from_millis(self.display_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn timer_interval(&self) -> Duration {
        Duration::from_millis(self.timer_interval_ms)
    }
}

/// Offline export bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    pub min_duration_secs: f64,
    pub max_duration_secs: f64,
    pub default_duration_secs: f64,
    /// Seed for noise in exported files, so the same parameters give the same file.
    pub noise_seed: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            min_duration_secs: 1.0,
            max_duration_secs: 30.0,
            default_duration_secs: 5.0,
            noise_seed: 0x5EED_7011E,
        }
    }
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), ToneError> {
        let (min, max, default) = (self.min_duration_secs, self.max_duration_secs, self.default_duration_secs);
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(ToneError::invalid("export", format!("bad duration bounds [{min}, {max}]")));
        }
        if !(min..=max).contains(&default) {
            return Err(ToneError::invalid("export", format!("default duration {default} outside [{min}, {max}]")));
        }
        Ok(())
    }

    /// Check a requested export duration against the bounds.
    pub fn check_duration(&self, secs: f64) -> Result<f64, ToneError> {
        if secs.is_finite() && (self.min_duration_secs..=self.max_duration_secs).contains(&secs) {
            Ok(secs)
        } else {
            Err(ToneError::invalid(
                "duration_secs",
                format!(
                    "export duration must be within [{}, {}] s, got {secs}",
                    self.min_duration_secs, self.max_duration_secs
                ),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.analysis_window, 2048);
        assert_eq!(config.sweep_interval(), Duration::from_millis(33));
        assert_eq!(config.detector.min_lag, 10);
        assert_eq!(config.export.default_duration_secs, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"sampleRate": 48000, "detector": {"rmsGate": 0.0}}"#).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.detector.rms_gate, 0.0);
        assert_eq!(config.detector.min_confidence, 0.3);
        assert_eq!(config.timer_interval_ms, 1000);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ToneError::Config(_))));
        assert!(EngineConfig::from_json(r#"{"sampleRate": 0}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"sweepIntervalMs": 0}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"analysisWindow": 8}"#).is_err());
    }

    #[test]
    fn export_duration_bounds() {
        let export = ExportConfig::default();
        assert_eq!(export.check_duration(1.0).unwrap(), 1.0);
        assert_eq!(export.check_duration(30.0).unwrap(), 30.0);
        assert!(export.check_duration(0.5).is_err());
        assert!(export.check_duration(31.0).is_err());
        assert!(export.check_duration(f64::NAN).is_err());
    }
}
