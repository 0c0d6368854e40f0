//! CLI Command Implementations

use std::path::Path;

use log::info;

use crate::engine::pipeline::{render, RenderReport};
use crate::error::Result;

/// Render the dumps at `basename` and print a short summary.
pub fn render_command(basename: &Path) -> Result<RenderReport> {
    info!("Rendering {}", basename.display());

    let report = render(basename)?;

    println!("Wrote {}", report.output.display());
    println!(
        "  {} frames ({:.2}s), {} bytes",
        report.frames,
        report.duration_secs(),
        report.encoded_bytes
    );
    println!("  PCM SHA-256: {}", report.pcm_sha256);

    Ok(report)
}
