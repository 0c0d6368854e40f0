//! FLAC stream assembly
//!
//! Writes the `fLaC` marker, a STREAMINFO block, a VORBIS_COMMENT block with
//! the vendor string and then one frame per block of 4096 samples.

use log::debug;

use super::bitwriter::BitWriter;
use super::frame::encode_frame;
use crate::engine::buffer::OUTPUT_CHANNELS;
use crate::error::{AymixError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Stream marker
pub const STREAM_MARKER: &[u8; 4] = b"fLaC";

/// Samples per channel in every frame except possibly the last
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Output sample width
pub const BITS_PER_SAMPLE: u32 = 16;

/// Frame header sample size code for 16 bits per sample
const SAMPLE_SIZE_CODE_16: u64 = 0b100;

const BLOCK_TYPE_STREAMINFO: u64 = 0;
const BLOCK_TYPE_VORBIS_COMMENT: u64 = 4;

/// Largest value of the 20-bit STREAMINFO sample rate field
const MAX_SAMPLE_RATE: u32 = (1 << 20) - 1;

/// Largest value of the 36-bit STREAMINFO total samples field
const MAX_TOTAL_SAMPLES: u64 = (1 << 36) - 1;

// ============================================================================
// STREAMINFO
// ============================================================================

/// Contents of the mandatory STREAMINFO metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub min_block_size: u16,
    pub max_block_size: u16,
    /// Smallest frame in bytes, 0 if unknown
    pub min_frame_size: u32,
    /// Largest frame in bytes, 0 if unknown
    pub max_frame_size: u32,
    pub sample_rate: u32,
    pub channels: u8,
    pub bits_per_sample: u8,
    pub total_samples: u64,
    /// Signature of the unencoded audio; all zero when not computed
    pub md5: [u8; 16],
}

impl StreamInfo {
    /// Serialized length of the block body
    pub const LEN: usize = 34;

    fn write(&self, writer: &mut BitWriter) {
        writer.write_bits(u64::from(self.min_block_size), 16);
        writer.write_bits(u64::from(self.max_block_size), 16);
        writer.write_bits(u64::from(self.min_frame_size), 24);
        writer.write_bits(u64::from(self.max_frame_size), 24);
        writer.write_bits(u64::from(self.sample_rate), 20);
        writer.write_bits(u64::from(self.channels - 1), 3);
        writer.write_bits(u64::from(self.bits_per_sample - 1), 5);
        writer.write_bits(self.total_samples >> 32, 4);
        writer.write_bits(self.total_samples & 0xFFFF_FFFF, 32);
        for &byte in &self.md5 {
            writer.write_bits(u64::from(byte), 8);
        }
    }
}

fn write_block_header(writer: &mut BitWriter, is_last: bool, block_type: u64, len: usize) {
    writer.write_bits(u64::from(is_last), 1);
    writer.write_bits(block_type, 7);
    writer.write_bits(len as u64, 24);
}

/// VORBIS_COMMENT body: little-endian vendor length, vendor, zero comments
fn vorbis_comment(vendor: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(vendor.len() + 8);
    body.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
    body.extend_from_slice(vendor.as_bytes());
    body.extend_from_slice(&0u32.to_le_bytes());
    body
}

// ============================================================================
// Encoder
// ============================================================================

/// Encoder for 16-bit stereo FLAC streams
#[derive(Debug, Clone)]
pub struct FlacEncoder {
    sample_rate: u32,
    block_size: usize,
    vendor: String,
}

impl FlacEncoder {
    /// Create an encoder for `sample_rate` with the default block size
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            block_size: DEFAULT_BLOCK_SIZE,
            vendor: format!("aymix {}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Override the block size (16 to 65535 samples)
    #[cfg(test)]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    fn validate(&self, left: &[i16], right: &[i16]) -> Result<()> {
        if left.len() != right.len() {
            return Err(AymixError::Encode {
                reason: format!(
                    "channel lengths differ ({} vs {})",
                    left.len(),
                    right.len()
                ),
            });
        }
        if self.sample_rate == 0 || self.sample_rate > MAX_SAMPLE_RATE {
            return Err(AymixError::Encode {
                reason: format!("unsupported sample rate {} Hz", self.sample_rate),
            });
        }
        if !(16..=usize::from(u16::MAX)).contains(&self.block_size) {
            return Err(AymixError::Encode {
                reason: format!("unsupported block size {}", self.block_size),
            });
        }
        if left.len() as u64 > MAX_TOTAL_SAMPLES {
            return Err(AymixError::Encode {
                reason: format!("{} samples exceed the stream limit", left.len()),
            });
        }
        Ok(())
    }

    /// Encode a complete stream from the two channels
    pub fn encode_stereo(&self, left: &[i16], right: &[i16]) -> Result<Vec<u8>> {
        self.validate(left, right)?;

        let frames: Vec<Vec<u8>> = left
            .chunks(self.block_size)
            .zip(right.chunks(self.block_size))
            .enumerate()
            .map(|(n, (l, r))| {
                encode_frame(
                    n as u64,
                    l,
                    r,
                    self.sample_rate,
                    BITS_PER_SAMPLE,
                    SAMPLE_SIZE_CODE_16,
                )
            })
            .collect();

        // A stream of a single short block advertises that block's size
        let block_size = match left.len() {
            len @ 1.. if len < self.block_size => len,
            _ => self.block_size,
        };

        let info = StreamInfo {
            min_block_size: block_size as u16,
            max_block_size: block_size as u16,
            min_frame_size: frames.iter().map(|f| f.len() as u32).min().unwrap_or(0),
            max_frame_size: frames.iter().map(|f| f.len() as u32).max().unwrap_or(0),
            sample_rate: self.sample_rate,
            channels: OUTPUT_CHANNELS as u8,
            bits_per_sample: BITS_PER_SAMPLE as u8,
            total_samples: left.len() as u64,
            md5: [0; 16],
        };

        let comment = vorbis_comment(&self.vendor);
        let audio_len: usize = frames.iter().map(Vec::len).sum();

        let mut header = BitWriter::with_capacity(4 + 4 + StreamInfo::LEN + 4 + comment.len());
        for &byte in STREAM_MARKER {
            header.write_bits(u64::from(byte), 8);
        }
        write_block_header(&mut header, false, BLOCK_TYPE_STREAMINFO, StreamInfo::LEN);
        info.write(&mut header);
        write_block_header(&mut header, true, BLOCK_TYPE_VORBIS_COMMENT, comment.len());

        let mut stream = header.into_bytes();
        stream.reserve(comment.len() + audio_len);
        stream.extend_from_slice(&comment);
        for frame in &frames {
            stream.extend_from_slice(frame);
        }

        debug!(
            "Encoded {} samples in {} frames ({} bytes, frames {}..{} bytes)",
            info.total_samples,
            frames.len(),
            stream.len(),
            info.min_frame_size,
            info.max_frame_size
        );

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flac::crc::crc16;
    use pretty_assertions::assert_eq;

    fn parse_streaminfo(stream: &[u8]) -> (u32, u8, u8, u64) {
        let body = &stream[8..8 + StreamInfo::LEN];
        let rate = (u32::from(body[10]) << 12)
            | (u32::from(body[11]) << 4)
            | (u32::from(body[12]) >> 4);
        let channels = ((body[12] >> 1) & 0x07) + 1;
        let bps = (((body[12] & 0x01) << 4) | (body[13] >> 4)) + 1;
        let total = (u64::from(body[13] & 0x0F) << 32)
            | u64::from(u32::from_be_bytes([body[14], body[15], body[16], body[17]]));
        (rate, channels, bps, total)
    }

    #[test]
    fn test_stream_header_layout() {
        let encoder = FlacEncoder::new(48_000);
        let left = vec![0i16; 10_000];
        let right = vec![0i16; 10_000];
        let stream = encoder.encode_stereo(&left, &right).unwrap();

        assert_eq!(&stream[..4], b"fLaC");
        // Not-last STREAMINFO of 34 bytes
        assert_eq!(&stream[4..8], &[0x00, 0x00, 0x00, 0x22]);
        assert_eq!(&stream[8..12], &[0x10, 0x00, 0x10, 0x00]);
        assert_eq!(parse_streaminfo(&stream), (48_000, 2, 16, 10_000));
        assert!(stream[26..42].iter().all(|&b| b == 0));

        // Last block: VORBIS_COMMENT with vendor string
        let comment_header = &stream[42..46];
        assert_eq!(comment_header[0], 0x84);
        let vendor_len =
            u32::from_le_bytes([stream[46], stream[47], stream[48], stream[49]]) as usize;
        assert_eq!(&stream[50..50 + vendor_len], encoder.vendor().as_bytes());
        assert!(encoder.vendor().starts_with("aymix "));
    }

    #[test]
    fn test_short_stream_advertises_its_length() {
        let encoder = FlacEncoder::new(48_000);
        let left = vec![100i16; 192];
        let right = vec![-100i16; 192];
        let stream = encoder.encode_stereo(&left, &right).unwrap();

        // min/max block size 192
        assert_eq!(&stream[8..12], &[0x00, 0xC0, 0x00, 0xC0]);
        assert_eq!(parse_streaminfo(&stream).3, 192);

        let full = encoder.encode_stereo(&[0; 4096], &[0; 4096]).unwrap();
        assert_eq!(&full[8..12], &[0x10, 0x00, 0x10, 0x00]);
    }

    #[test]
    fn test_frames_follow_metadata() {
        let encoder = FlacEncoder::new(48_000);
        let left: Vec<i16> = (0..9000).map(|i| ((i % 200) * 100 - 10_000) as i16).collect();
        let right: Vec<i16> = left.iter().map(|&s| s / 2).collect();
        let stream = encoder.encode_stereo(&left, &right).unwrap();

        let comment_len = 8 + encoder.vendor().len();
        let first_frame = 42 + 4 + comment_len;
        assert_eq!(&stream[first_frame..first_frame + 2], &[0xFF, 0xF8]);

        // Frame sizes recorded in STREAMINFO bound the actual frames
        let body = &stream[8..8 + StreamInfo::LEN];
        let min_frame = u32::from_be_bytes([0, body[4], body[5], body[6]]) as usize;
        let max_frame = u32::from_be_bytes([0, body[7], body[8], body[9]]) as usize;
        assert!(min_frame > 0 && min_frame <= max_frame);
        assert!(stream.len() - first_frame >= 3 * min_frame);
        assert!(stream.len() - first_frame <= 3 * max_frame);
    }

    #[test]
    fn test_single_frame_crc() {
        let encoder = FlacEncoder::new(48_000);
        let left: Vec<i16> = (0..1000).map(|i| (i * 13 % 512) as i16).collect();
        let right = left.clone();
        let stream = encoder.encode_stereo(&left, &right).unwrap();

        let first_frame = 42 + 4 + 8 + encoder.vendor().len();
        assert_eq!(crc16(&stream[first_frame..]), 0);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = FlacEncoder::new(48_000);
        let left: Vec<i16> = (0..5000).map(|i| (i * 7 % 3000) as i16).collect();
        let right: Vec<i16> = (0..5000).map(|i| -(i * 3 % 2000) as i16).collect();

        let first = encoder.encode_stereo(&left, &right).unwrap();
        let second = encoder.encode_stereo(&left, &right).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_mismatched_channels() {
        let encoder = FlacEncoder::new(48_000);
        let err = encoder.encode_stereo(&[0; 10], &[0; 9]).unwrap_err();
        assert_eq!(err.error_code(), "ENCODE");
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        assert!(FlacEncoder::new(0).encode_stereo(&[0], &[0]).is_err());
        assert!(FlacEncoder::new(48_000)
            .with_block_size(8)
            .encode_stereo(&[0], &[0])
            .is_err());
    }

    #[test]
    fn test_empty_stream_has_only_metadata() {
        let encoder = FlacEncoder::new(48_000);
        let stream = encoder.encode_stereo(&[], &[]).unwrap();
        assert_eq!(stream.len(), 42 + 4 + 8 + encoder.vendor().len());
        assert_eq!(parse_streaminfo(&stream).3, 0);
    }
}
