use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::ToneError;
use crate::params::ToneParameters;

#[derive(Debug)]
struct Shared {
    params: ToneParameters,
    generation: u64,
}

impl Shared {
    fn replace(&mut self, params: ToneParameters) -> u64 {
        self.params = params;
        self.generation += 1;
        self.generation
    }
}

/// Shared, validated tone parameters.
///
/// Hosts write from any thread; the render path reads one snapshot per
/// block and compares generations to see whether anything changed.
/// Cloning the handle shares the same parameters.
#[derive(Debug, Clone)]
pub struct ParameterHandle {
    inner: Arc<Mutex<Shared>>,
}

impl Default for ParameterHandle {
    fn default() -> Self {
        ParameterHandle {
            inner: Arc::new(Mutex::new(Shared {
                params: ToneParameters::default(),
                generation: 0,
            })),
        }
    }
}

impl ParameterHandle {
    pub fn new(params: ToneParameters) -> Result<Self, ToneError> {
        let handle = ParameterHandle::default();
        handle.set(params)?;
        Ok(handle)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the parameters. Invalid input leaves the previous value in place.
    ///
    /// Returns the new generation.
    pub fn set(&self, params: ToneParameters) -> Result<u64, ToneError> {
        let params = params.sanitized()?;
        Ok(self.lock().replace(params))
    }

    /// Edit a copy of the parameters and validate it, all under one lock,
    /// so concurrent edits never overwrite each other.
    pub fn update(&self, edit: impl FnOnce(&mut ToneParameters)) -> Result<u64, ToneError> {
        let mut shared = self.lock();
        let mut next = shared.params.clone();
        edit(&mut next);
        let next = next.sanitized()?;
        Ok(shared.replace(next))
    }

    /// Current generation and a copy of the parameters.
    pub fn snapshot(&self) -> (u64, ToneParameters) {
        let shared = self.lock();
        (shared.generation, shared.params.clone())
    }

    pub fn get(&self) -> ToneParameters {
        self.lock().params.clone()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::WaveformKind;

    #[test]
    fn set_bumps_generation_and_clamps() {
        let handle = ParameterHandle::default();
        assert_eq!(handle.generation(), 0);
        let generation = handle.set(ToneParameters::tone(99_999.0, WaveformKind::Sine)).unwrap();
        assert_eq!(generation, 1);
        assert_eq!(handle.get().frequency, 20_000.0);
    }

    #[test]
    fn rejected_update_keeps_previous_value() {
        let handle = ParameterHandle::new(ToneParameters::tone(300.0, WaveformKind::Sine)).unwrap();
        let before = handle.snapshot();
        let result = handle.update(|p| {
            p.waveform = WaveformKind::Binaural;
            p.binaural_beat_hz = 0.0;
        });
        assert!(result.is_err());
        assert_eq!(handle.snapshot(), before);
    }

    #[test]
    fn clones_share_state() {
        let handle = ParameterHandle::default();
        let host = handle.clone();
        host.update(|p| p.volume = 80.0).unwrap();
        assert_eq!(handle.get().volume, 80.0);
        assert_eq!(handle.generation(), 1);
    }

    #[test]
    fn writes_from_other_threads_are_seen() {
        let handle = ParameterHandle::default();
        let writer = handle.clone();
        std::thread::spawn(move || {
            for i in 0..100 {
                writer.update(|p| p.frequency = 100.0 + i as f64).unwrap();
            }
        })
        .join()
        .unwrap();
        let (generation, params) = handle.snapshot();
        assert_eq!(generation, 100);
        assert_eq!(params.frequency, 199.0);
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let handle = ParameterHandle::new(ToneParameters::tone(100.0, WaveformKind::Sine)).unwrap();
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let writer = handle.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        writer.update(|p| p.frequency += 1.0).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        let (generation, params) = handle.snapshot();
        assert_eq!(generation, 1001);
        assert_eq!(params.frequency, 1100.0);
    }
}
