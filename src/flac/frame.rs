//! Audio frame coding
//!
//! A frame holds one block of both channels: a header with its own CRC-8,
//! one subframe per channel and a trailing CRC-16 over the whole frame.

use super::bitwriter::BitWriter;
use super::crc::{crc16, crc8};
use super::subframe::Subframe;

/// Sync code, reserved bit and fixed blocking strategy
const FRAME_SYNC: u64 = 0xFFF8;

/// Stereo decorrelation mode of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssignment {
    /// Left and right coded separately
    Independent,
    /// Left and `left - right`
    LeftSide,
    /// `left - right` and right
    SideRight,
    /// `(left + right) >> 1` and `left - right`
    MidSide,
}

impl ChannelAssignment {
    /// Header field value for two channels
    pub fn code(self) -> u64 {
        match self {
            ChannelAssignment::Independent => 0b0001,
            ChannelAssignment::LeftSide => 0b1000,
            ChannelAssignment::SideRight => 0b1001,
            ChannelAssignment::MidSide => 0b1010,
        }
    }
}

/// Block size field code plus the optional trailing value and its width
pub fn block_size_code(block_size: usize) -> (u64, Option<(u64, u32)>) {
    match block_size {
        192 => (0b0001, None),
        576 => (0b0010, None),
        1152 => (0b0011, None),
        2304 => (0b0100, None),
        4608 => (0b0101, None),
        256 => (0b1000, None),
        512 => (0b1001, None),
        1024 => (0b1010, None),
        2048 => (0b1011, None),
        4096 => (0b1100, None),
        8192 => (0b1101, None),
        16384 => (0b1110, None),
        32768 => (0b1111, None),
        n if n <= 256 => (0b0110, Some((n as u64 - 1, 8))),
        n => (0b0111, Some((n as u64 - 1, 16))),
    }
}

/// Sample rate field code; rates without a code defer to STREAMINFO
pub fn sample_rate_code(sample_rate: u32) -> u64 {
    match sample_rate {
        88_200 => 0b0001,
        176_400 => 0b0010,
        192_000 => 0b0011,
        8_000 => 0b0100,
        16_000 => 0b0101,
        22_050 => 0b0110,
        24_000 => 0b0111,
        32_000 => 0b1000,
        44_100 => 0b1001,
        48_000 => 0b1010,
        96_000 => 0b1011,
        _ => 0b0000,
    }
}

/// Frame number in the extended UTF-8 style coding (up to 36 bits)
pub fn utf8_coded(value: u64) -> Vec<u8> {
    let len = match value {
        0..=0x7F => return vec![value as u8],
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x1F_FFFF => 4,
        0x20_0000..=0x3FF_FFFF => 5,
        0x400_0000..=0x7FFF_FFFF => 6,
        _ => 7,
    };

    let mut bytes = vec![0u8; len];
    let mut rest = value;
    for byte in bytes.iter_mut().skip(1).rev() {
        *byte = 0x80 | (rest & 0x3F) as u8;
        rest >>= 6;
    }
    bytes[0] = (0xFF00_u16 >> len) as u8 | rest as u8;
    bytes
}

/// Planned subframes for the cheapest channel assignment
struct StereoPlan {
    assignment: ChannelAssignment,
    first: (Vec<i64>, Subframe),
    second: (Vec<i64>, Subframe),
}

fn plan_stereo(left: &[i16], right: &[i16], bits_per_sample: u32) -> StereoPlan {
    let left: Vec<i64> = left.iter().map(|&s| i64::from(s)).collect();
    let right: Vec<i64> = right.iter().map(|&s| i64::from(s)).collect();
    let mid: Vec<i64> = left.iter().zip(&right).map(|(l, r)| (l + r) >> 1).collect();
    let side: Vec<i64> = left.iter().zip(&right).map(|(l, r)| l - r).collect();

    let l = Subframe::plan(&left, bits_per_sample);
    let r = Subframe::plan(&right, bits_per_sample);
    let m = Subframe::plan(&mid, bits_per_sample);
    let s = Subframe::plan(&side, bits_per_sample + 1);

    let candidates = [
        (ChannelAssignment::Independent, l.bits + r.bits),
        (ChannelAssignment::LeftSide, l.bits + s.bits),
        (ChannelAssignment::SideRight, s.bits + r.bits),
        (ChannelAssignment::MidSide, m.bits + s.bits),
    ];
    let assignment = candidates
        .iter()
        .min_by_key(|(_, bits)| *bits)
        .map(|(assignment, _)| *assignment)
        .unwrap_or(ChannelAssignment::Independent);

    let (first, second) = match assignment {
        ChannelAssignment::Independent => ((left, l), (right, r)),
        ChannelAssignment::LeftSide => ((left, l), (side, s)),
        ChannelAssignment::SideRight => ((side, s), (right, r)),
        ChannelAssignment::MidSide => ((mid, m), (side, s)),
    };

    StereoPlan {
        assignment,
        first,
        second,
    }
}

/// Encode one stereo block and return the frame bytes
///
/// `left` and `right` must have the same, non-zero length.
pub fn encode_frame(
    frame_number: u64,
    left: &[i16],
    right: &[i16],
    sample_rate: u32,
    bits_per_sample: u32,
    sample_size_code: u64,
) -> Vec<u8> {
    let block_size = left.len();
    let plan = plan_stereo(left, right, bits_per_sample);

    let mut writer = BitWriter::with_capacity(block_size * 4 + 32);

    // Header
    let (bs_code, bs_extra) = block_size_code(block_size);
    writer.write_bits(FRAME_SYNC, 16);
    writer.write_bits(bs_code, 4);
    writer.write_bits(sample_rate_code(sample_rate), 4);
    writer.write_bits(plan.assignment.code(), 4);
    writer.write_bits(sample_size_code, 3);
    writer.write_bits(0, 1);
    for byte in utf8_coded(frame_number) {
        writer.write_bits(u64::from(byte), 8);
    }
    if let Some((value, bits)) = bs_extra {
        writer.write_bits(value, bits);
    }
    let header_crc = crc8(writer.bytes());
    writer.write_bits(u64::from(header_crc), 8);

    // Subframes
    let (samples, subframe) = &plan.first;
    subframe.write(samples, &mut writer);
    let (samples, subframe) = &plan.second;
    subframe.write(samples, &mut writer);

    // Footer
    writer.align();
    let frame_crc = crc16(writer.bytes());
    writer.write_bits(u64::from(frame_crc), 16);

    writer.into_bytes()
}
