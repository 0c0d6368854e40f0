//! Render pipeline
//!
//! Sequences the stages: load, resample each channel, mix to stereo, apply
//! the shaping filter, normalize, quantize, encode and write.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use log::info;
use sha2::{Digest, Sha256};

use crate::dsp::{mix, normalize_peak, shaping_filter, PolyphaseResampler};
use crate::engine::buffer::{
    Channel, ChannelDumps, StereoSignal, OUTPUT_SAMPLE_RATE, SOURCE_SAMPLE_RATE,
};
use crate::engine::io::{load_dumps, output_path, write_atomic};
use crate::error::{AymixError, Result};
use crate::flac::{interleaved_le_bytes, quantize_stereo, FlacEncoder};

/// Summary of a finished render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    /// Written `.flac` file
    pub output: PathBuf,
    /// Samples in the A, B and C dumps
    pub source_lengths: [usize; 3],
    /// Stereo frames in the output
    pub frames: usize,
    /// Largest magnitude after filtering, before normalization
    pub peak: f64,
    /// Size of the encoded file
    pub encoded_bytes: usize,
    /// SHA-256 of the interleaved little-endian 16-bit PCM, hex encoded
    pub pcm_sha256: String,
}

impl RenderReport {
    /// Duration of the output in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / OUTPUT_SAMPLE_RATE as f64
    }
}

/// Quantized stereo output of the signal stages
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPcm {
    pub left: Vec<i16>,
    pub right: Vec<i16>,
    /// Peak found by the normalizer
    pub peak: f64,
}

impl RenderedPcm {
    /// Number of stereo frames
    pub fn num_frames(&self) -> usize {
        self.left.len()
    }

    /// Hex SHA-256 of the interleaved PCM
    pub fn sha256(&self) -> String {
        let digest = Sha256::digest(interleaved_le_bytes(&self.left, &self.right));
        format!("{:x}", digest)
    }
}

/// Resample all three dumps to the output rate, one worker thread each
pub fn resample_channels(dumps: &ChannelDumps) -> [Vec<f64>; 3] {
    let resampler = PolyphaseResampler::ay_to_output();
    let resampler = &resampler;

    thread::scope(|scope| {
        let handles = Channel::ALL.map(|channel| {
            let samples = dumps.channel(channel);
            scope.spawn(move || resampler.process_u16(samples))
        });
        handles.map(|handle| {
            handle
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
        })
    })
}

/// Run the signal stages from raw dumps to mixed, filtered stereo
///
/// # Errors
/// * `EmptyInput` - If the shortest dump yields no output frame
pub fn render_signal(dumps: &ChannelDumps) -> Result<StereoSignal> {
    let started = Instant::now();
    let resampled = resample_channels(dumps);
    info!(
        "Resampled {:?} samples to {:?} at {} Hz in {:.2?}",
        dumps.lengths(),
        resampled.iter().map(Vec::len).collect::<Vec<_>>(),
        OUTPUT_SAMPLE_RATE,
        started.elapsed()
    );

    let mut signal = mix(&resampled);
    if signal.is_empty() {
        return Err(AymixError::EmptyInput);
    }

    let started = Instant::now();
    shaping_filter().apply_stereo(&mut signal);
    info!(
        "Filtered {} frames ({:.2}s) in {:.2?}",
        signal.num_frames(),
        signal.duration_secs(),
        started.elapsed()
    );

    Ok(signal)
}

/// Run every signal stage and quantize to 16-bit PCM
pub fn render_pcm(dumps: &ChannelDumps) -> Result<RenderedPcm> {
    let mut signal = render_signal(dumps)?;

    let peak = normalize_peak(&mut signal);
    info!("Normalized with peak {:.6}", peak);

    let (left, right) = quantize_stereo(&signal);
    Ok(RenderedPcm { left, right, peak })
}

/// Render `<base>_a`, `<base>_b` and `<base>_c` into `<base>.flac`
///
/// Nothing is written unless every stage succeeds.
pub fn render(base: &Path) -> Result<RenderReport> {
    let started = Instant::now();
    let dumps = load_dumps(base)?;
    info!(
        "Loaded dumps for {} ({:?} samples at {} Hz)",
        base.display(),
        dumps.lengths(),
        SOURCE_SAMPLE_RATE
    );

    let pcm = render_pcm(&dumps)?;

    let encode_started = Instant::now();
    let encoded = FlacEncoder::new(OUTPUT_SAMPLE_RATE).encode_stereo(&pcm.left, &pcm.right)?;
    info!(
        "Encoded {} bytes of FLAC in {:.2?}",
        encoded.len(),
        encode_started.elapsed()
    );

    let output = output_path(base);
    write_atomic(&output, &encoded)?;

    let report = RenderReport {
        output,
        source_lengths: dumps.lengths(),
        frames: pcm.num_frames(),
        peak: pcm.peak,
        encoded_bytes: encoded.len(),
        pcm_sha256: pcm.sha256(),
    };
    info!(
        "Rendered {} in {:.2?}",
        report.output.display(),
        started.elapsed()
    );

    Ok(report)
}
