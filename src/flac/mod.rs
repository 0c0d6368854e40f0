//! Lossless FLAC encoder
//!
//! Produces 16-bit stereo streams with fixed-size blocks, per-frame stereo
//! decorrelation and FIXED linear prediction with partitioned Rice coding.
//! Any conforming decoder returns the quantized PCM bit-exactly.

mod bitwriter;
mod crc;
mod encoder;
mod frame;
mod pcm;
mod subframe;

pub use bitwriter::BitWriter;
pub use crc::{crc16, crc8};
pub use encoder::{FlacEncoder, StreamInfo, BITS_PER_SAMPLE, DEFAULT_BLOCK_SIZE, STREAM_MARKER};
pub use frame::ChannelAssignment;
pub use pcm::{interleaved_le_bytes, quantize_sample, quantize_stereo, PCM16_SCALE};
