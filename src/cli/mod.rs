//! CLI Module
//!
//! Command-line interface for aymix.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

/// Mix AY-3-8910 channel dumps into a 48 kHz stereo FLAC file
///
/// Reads <BASENAME>_a, <BASENAME>_b and <BASENAME>_c (raw little-endian
/// unsigned 16-bit samples at 218750 Hz) and writes <BASENAME>.flac.
#[derive(Parser, Debug)]
#[command(name = "aymix")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    /// Common prefix of the three channel dumps
    pub basename: PathBuf,
}

impl Cli {
    /// Default log filter when RUST_LOG is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
