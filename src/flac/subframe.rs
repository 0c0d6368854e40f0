//! Subframe analysis and coding
//!
//! Each channel of a frame is coded as CONSTANT, VERBATIM or FIXED
//! prediction with a partitioned Rice residual. Planning computes the exact
//! size of every candidate so channel decorrelation can pick the cheapest
//! combination before anything is written.

use super::bitwriter::BitWriter;

// ============================================================================
// Constants
// ============================================================================

/// Highest FIXED predictor order
pub const MAX_FIXED_ORDER: usize = 4;

/// Highest Rice parameter expressible without the escape code
pub const MAX_RICE_PARAM: u32 = 14;

/// Highest partition order searched
pub const MAX_PARTITION_ORDER: u32 = 8;

/// Subframe header: padding bit, 6 type bits, wasted-bits flag
const SUBFRAME_HEADER_BITS: u64 = 8;

/// Residual coding method and partition order fields
const RESIDUAL_HEADER_BITS: u64 = 2 + 4;

/// Rice parameter field per partition
const RICE_PARAM_BITS: u64 = 4;

// ============================================================================
// Residuals
// ============================================================================

/// Residual of the FIXED predictor of `order` for `samples[order..]`
pub fn fixed_residual(samples: &[i64], order: usize) -> Vec<i64> {
    let s = samples;
    (order..s.len())
        .map(|i| match order {
            0 => s[i],
            1 => s[i] - s[i - 1],
            2 => s[i] - 2 * s[i - 1] + s[i - 2],
            3 => s[i] - 3 * s[i - 1] + 3 * s[i - 2] - s[i - 3],
            _ => s[i] - 4 * s[i - 1] + 6 * s[i - 2] - 4 * s[i - 3] + s[i - 4],
        })
        .collect()
}

/// Map signed residuals onto unsigned values: 0, -1, 1, -2, ... -> 0, 1, 2, 3, ...
#[inline]
pub fn fold(residual: i64) -> u64 {
    ((residual << 1) ^ (residual >> 63)) as u64
}

// ============================================================================
// Rice partitioning
// ============================================================================

/// Chosen partition order and per-partition Rice parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RicePartitioning {
    pub order: u32,
    pub params: Vec<u32>,
    /// Size of the whole residual section including its header
    pub bits: u64,
}

/// Cost of one partition for every Rice parameter
#[derive(Debug, Clone)]
struct PartitionCost {
    count: u64,
    /// `shifted[k]` is the sum of `u >> k` over the partition
    shifted: [u64; MAX_RICE_PARAM as usize + 1],
}

impl PartitionCost {
    fn merge(&self, other: &Self) -> Self {
        let mut shifted = self.shifted;
        for (s, o) in shifted.iter_mut().zip(other.shifted.iter()) {
            *s += o;
        }
        Self {
            count: self.count + other.count,
            shifted,
        }
    }

    /// Cheapest parameter and its cost including the parameter field
    fn best(&self) -> (u32, u64) {
        (0..=MAX_RICE_PARAM)
            .map(|k| {
                let unary_and_remainder = self.count * (1 + u64::from(k));
                (k, RICE_PARAM_BITS + unary_and_remainder + self.shifted[k as usize])
            })
            .min_by_key(|&(_, bits)| bits)
            .unwrap_or((0, RICE_PARAM_BITS))
    }
}

/// Highest usable partition order for a block
///
/// The block must split evenly and the first partition must still hold at
/// least one residual after the warm-up samples.
fn max_partition_order(block_size: usize, predictor_order: usize) -> u32 {
    let mut order = 0;
    while order < MAX_PARTITION_ORDER {
        let next = order + 1;
        if block_size % (1 << next) != 0 || (block_size >> next) <= predictor_order {
            break;
        }
        order = next;
    }
    order
}

/// Search partition orders for the smallest residual encoding
pub fn choose_partitioning(
    residual: &[i64],
    block_size: usize,
    predictor_order: usize,
) -> RicePartitioning {
    let max_order = max_partition_order(block_size, predictor_order);
    let partitions = 1usize << max_order;
    let partition_len = block_size >> max_order;

    // Finest level, residual i belongs to sample position i + predictor_order
    let mut level: Vec<PartitionCost> = (0..partitions)
        .map(|p| {
            let start = (p * partition_len).saturating_sub(predictor_order);
            let end = ((p + 1) * partition_len - predictor_order).min(residual.len());
            let mut shifted = [0u64; MAX_RICE_PARAM as usize + 1];
            for &r in &residual[start.min(end)..end] {
                let u = fold(r);
                for (k, s) in shifted.iter_mut().enumerate() {
                    *s += u >> k;
                }
            }
            PartitionCost {
                count: (end - start.min(end)) as u64,
                shifted,
            }
        })
        .collect();

    let mut best: Option<RicePartitioning> = None;
    let mut order = max_order;

    loop {
        let (params, bits): (Vec<u32>, Vec<u64>) = level.iter().map(PartitionCost::best).unzip();
        let total = RESIDUAL_HEADER_BITS + bits.iter().sum::<u64>();

        if best.as_ref().map_or(true, |b| total <= b.bits) {
            best = Some(RicePartitioning {
                order,
                params,
                bits: total,
            });
        }

        if order == 0 {
            break;
        }
        level = level.chunks(2).map(|pair| pair[0].merge(&pair[1])).collect();
        order -= 1;
    }

    best.unwrap_or(RicePartitioning {
        order: 0,
        params: vec![0],
        bits: RESIDUAL_HEADER_BITS + RICE_PARAM_BITS,
    })
}

// ============================================================================
// Subframe planning
// ============================================================================

/// How a subframe is coded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubframeKind {
    Constant,
    Verbatim,
    Fixed {
        order: usize,
        residual: Vec<i64>,
        partitioning: RicePartitioning,
    },
}

/// A fully sized coding decision for one channel of one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subframe {
    pub kind: SubframeKind,
    /// Sample width of this channel (17 for a side channel)
    pub bits_per_sample: u32,
    /// Exact encoded size in bits
    pub bits: u64,
}

impl Subframe {
    /// Pick the smallest coding for `samples`
    pub fn plan(samples: &[i64], bits_per_sample: u32) -> Self {
        let bps = u64::from(bits_per_sample);
        let n = samples.len();

        if samples.windows(2).all(|w| w[0] == w[1]) {
            return Self {
                kind: SubframeKind::Constant,
                bits_per_sample,
                bits: SUBFRAME_HEADER_BITS + bps,
            };
        }

        let verbatim = Self {
            kind: SubframeKind::Verbatim,
            bits_per_sample,
            bits: SUBFRAME_HEADER_BITS + n as u64 * bps,
        };

        // Predictor order with the smallest total absolute residual
        let max_order = MAX_FIXED_ORDER.min(n - 1);
        let (order, residual) = (0..=max_order)
            .map(|order| {
                let residual = fixed_residual(samples, order);
                let magnitude: u64 = residual.iter().map(|r| r.unsigned_abs()).sum();
                (magnitude, order, residual)
            })
            .min_by_key(|(magnitude, order, _)| (*magnitude, *order))
            .map(|(_, order, residual)| (order, residual))
            .unwrap_or((0, fixed_residual(samples, 0)));

        let partitioning = choose_partitioning(&residual, n, order);
        let bits = SUBFRAME_HEADER_BITS + order as u64 * bps + partitioning.bits;

        if bits >= verbatim.bits {
            return verbatim;
        }

        Self {
            kind: SubframeKind::Fixed {
                order,
                residual,
                partitioning,
            },
            bits_per_sample,
            bits,
        }
    }

    /// Write the planned subframe for `samples`
    pub fn write(&self, samples: &[i64], writer: &mut BitWriter) {
        let bps = self.bits_per_sample;

        match &self.kind {
            SubframeKind::Constant => {
                writer.write_bits(0b0000_0000, 8);
                writer.write_signed(samples.first().copied().unwrap_or(0), bps);
            }
            SubframeKind::Verbatim => {
                writer.write_bits(0b0000_0010, 8);
                for &s in samples {
                    writer.write_signed(s, bps);
                }
            }
            SubframeKind::Fixed {
                order,
                residual,
                partitioning,
            } => {
                writer.write_bits(0b0001_0000 | ((*order as u64) << 1), 8);
                for &s in &samples[..*order] {
                    writer.write_signed(s, bps);
                }
                write_residual(residual, samples.len(), *order, partitioning, writer);
            }
        }
    }
}

fn write_residual(
    residual: &[i64],
    block_size: usize,
    predictor_order: usize,
    partitioning: &RicePartitioning,
    writer: &mut BitWriter,
) {
    // Method 00: 4-bit Rice parameters
    writer.write_bits(0b00, 2);
    writer.write_bits(u64::from(partitioning.order), 4);

    let partition_len = block_size >> partitioning.order;
    let mut offset = 0;

    for (p, &k) in partitioning.params.iter().enumerate() {
        let count = if p == 0 {
            partition_len - predictor_order
        } else {
            partition_len
        };

        writer.write_bits(u64::from(k), 4);
        for &r in &residual[offset..offset + count] {
            writer.write_rice(fold(r), k);
        }
        offset += count;
    }
}

// ============================================================================
// Tests
// ============================================================================
