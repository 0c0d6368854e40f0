//! Signal containers and rate constants
//!
//! Holds the raw per-channel dumps as loaded from disk and the stereo signal
//! that flows through the mix, filter and normalize stages.

// ============================================================================
// Constants
// ============================================================================

/// AY chip clock used by the renderer (Hz)
pub const AY_CLOCK_HZ: u32 = 1_750_000;

/// Rate of the channel dumps: the renderer emits one sample every 8 AY clocks
pub const SOURCE_SAMPLE_RATE: u32 = AY_CLOCK_HZ / 8;

/// Rate of the rendered output file (Hz)
pub const OUTPUT_SAMPLE_RATE: u32 = 48_000;

/// Number of output channels
pub const OUTPUT_CHANNELS: u16 = 2;

// ============================================================================
// Channel identity
// ============================================================================

/// One of the three tone/noise channels of the AY-3-8910
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    A,
    B,
    C,
}

impl Channel {
    /// All channels in dump order
    pub const ALL: [Channel; 3] = [Channel::A, Channel::B, Channel::C];

    /// Suffix appended to the base path to find this channel's dump
    pub fn dump_suffix(self) -> &'static str {
        match self {
            Channel::A => "_a",
            Channel::B => "_b",
            Channel::C => "_c",
        }
    }

    /// Position of the channel in [`Channel::ALL`]
    pub fn index(self) -> usize {
        match self {
            Channel::A => 0,
            Channel::B => 1,
            Channel::C => 2,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Channel::A => "A",
            Channel::B => "B",
            Channel::C => "C",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Raw dumps
// ============================================================================

/// The three raw amplitude dumps, sample-aligned on the source clock
///
/// Lengths are allowed to differ; downstream mixing stops at the shortest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDumps {
    pub channels: [Vec<u16>; 3],
}

impl ChannelDumps {
    /// Create from the A, B and C sequences
    pub fn new(a: Vec<u16>, b: Vec<u16>, c: Vec<u16>) -> Self {
        Self {
            channels: [a, b, c],
        }
    }

    /// Samples of one channel
    pub fn channel(&self, channel: Channel) -> &[u16] {
        &self.channels[channel.index()]
    }

    /// Source lengths of A, B and C
    pub fn lengths(&self) -> [usize; 3] {
        [
            self.channels[0].len(),
            self.channels[1].len(),
            self.channels[2].len(),
        ]
    }

    /// Whether all three dumps have the same length
    pub fn is_aligned(&self) -> bool {
        let [a, b, c] = self.lengths();
        a == b && b == c
    }
}

// ============================================================================
// Stereo signal
// ============================================================================

/// Floating point stereo signal at the output rate
///
/// Both channels always hold the same number of frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSignal {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl StereoSignal {
    /// Create a silent signal of `frames` frames
    pub fn silent(frames: usize) -> Self {
        Self {
            left: vec![0.0; frames],
            right: vec![0.0; frames],
        }
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        self.left.len()
    }

    /// Check if the signal holds no frames
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Duration in seconds at [`OUTPUT_SAMPLE_RATE`]
    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / OUTPUT_SAMPLE_RATE as f64
    }

    /// Largest absolute sample value across both channels
    pub fn peak(&self) -> f64 {
        self.left
            .iter()
            .chain(self.right.iter())
            .fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }
}
