//! Dump and output file I/O
//!
//! Reads the three raw `u16` channel dumps written by the AY renderer and
//! writes the encoded result. Output goes through a temporary file in the
//! destination directory so a failed run never leaves a partial `.flac`.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::engine::buffer::{Channel, ChannelDumps};
use crate::error::{AymixError, Result};

/// Extension of the rendered output
pub const OUTPUT_EXTENSION: &str = "flac";

/// Path of one channel dump: the suffix is appended to the whole base path
///
/// `song.v2` becomes `song.v2_a`, never `song_a.v2`.
pub fn dump_path(base: &Path, channel: Channel) -> PathBuf {
    append_to_path(base, channel.dump_suffix())
}

/// Path of the rendered output, `<base>.flac`
pub fn output_path(base: &Path) -> PathBuf {
    append_to_path(base, &format!(".{}", OUTPUT_EXTENSION))
}

fn append_to_path(base: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(base.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Reinterpret raw bytes as little-endian `u16` samples
///
/// A trailing odd byte cannot form a sample and is dropped.
pub fn decode_le_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Load one raw channel dump
///
/// # Arguments
/// * `path` - Dump file holding little-endian unsigned 16-bit samples
///
/// # Errors
/// * `InputNotFound` - If the file does not exist
/// * `InputRead` - If the file exists but cannot be read
pub fn load_channel_dump(path: &Path) -> Result<Vec<u16>> {
    let bytes = fs::read(path).map_err(|e| AymixError::input(path, e))?;

    if bytes.len() % 2 != 0 {
        warn!(
            "{} has an odd length of {} bytes, ignoring the trailing byte",
            path.display(),
            bytes.len()
        );
    }

    let samples = decode_le_u16(&bytes);
    debug!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Load the A, B and C dumps for `base`
///
/// Fails on the first dump that cannot be read.
pub fn load_dumps(base: &Path) -> Result<ChannelDumps> {
    let a = load_channel_dump(&dump_path(base, Channel::A))?;
    let b = load_channel_dump(&dump_path(base, Channel::B))?;
    let c = load_channel_dump(&dump_path(base, Channel::C))?;

    let dumps = ChannelDumps::new(a, b, c);
    if !dumps.is_aligned() {
        warn!(
            "Dump lengths differ {:?}, output follows the shortest",
            dumps.lengths()
        );
    }
    Ok(dumps)
}

/// Write `bytes` to `path` atomically
///
/// The data is written and synced to a temporary file next to `path`, then
/// renamed over it. On failure the temporary file is removed and `path` is
/// left untouched.
///
/// # Errors
/// * `OutputWrite` - If any step of creating, writing or renaming fails
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let write_error = |source| AymixError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
