//! Render engine
//!
//! - Signal containers and rate constants
//! - Dump loading and atomic output
//! - The end-to-end render pipeline

pub mod buffer;
pub mod io;
pub mod pipeline;

pub use buffer::{Channel, ChannelDumps, StereoSignal, OUTPUT_SAMPLE_RATE, SOURCE_SAMPLE_RATE};
pub use io::{dump_path, load_channel_dump, load_dumps, output_path, write_atomic};
pub use pipeline::{render, render_pcm, render_signal, resample_channels, RenderReport, RenderedPcm};
