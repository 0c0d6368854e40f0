//! aymix - AY-3-8910 channel dump mixer
//!
//! Turns the three per-channel amplitude dumps of an AY render trace
//! (unsigned 16-bit samples at 218750 Hz) into a 48 kHz stereo FLAC file.
//!
//! # Pipeline
//!
//! 1. Load `<base>_a`, `<base>_b`, `<base>_c`
//! 2. Polyphase resampling by 192/875
//! 3. ABC stereo panning
//! 4. Elliptic shaping filter
//! 5. Peak normalization
//! 6. FLAC encoding to `<base>.flac`

pub mod cli;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod flac;

pub use engine::pipeline::{render, RenderReport};
pub use error::{AymixError, Result};
