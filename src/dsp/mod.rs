//! Signal processing: generators, mixing, analysis and encoding.
//!
//! The live engine and the offline renderer share every generator here,
//! so an exported file sounds exactly like playback.

pub mod analysis;
pub mod binaural;
pub mod block;
pub mod harmonics;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod renderer;
pub mod source;
pub mod sweep;
pub mod tuner;
pub mod wav;
