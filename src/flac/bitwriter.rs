//! MSB-first bit packing

/// Accumulates values of arbitrary bit width into bytes, most significant
/// bit first
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    /// Pending bits not yet forming a whole byte, right aligned
    acc: u64,
    /// Number of pending bits, always below 8 between calls
    pending: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            ..Self::default()
        }
    }

    /// Write the low `bits` bits of `value` (at most 32)
    pub fn write_bits(&mut self, value: u64, bits: u32) {
        debug_assert!(bits <= 32);
        if bits == 0 {
            return;
        }

        let mask = (1u64 << bits) - 1;
        self.acc = (self.acc << bits) | (value & mask);
        self.pending += bits;

        while self.pending >= 8 {
            self.pending -= 8;
            self.bytes.push((self.acc >> self.pending) as u8);
        }
        self.acc &= (1u64 << self.pending) - 1;
    }

    /// Write a two's complement value in `bits` bits
    pub fn write_signed(&mut self, value: i64, bits: u32) {
        self.write_bits(value as u64, bits);
    }

    /// Write `value` zero bits followed by a one bit
    pub fn write_unary(&mut self, mut value: u64) {
        while value >= 32 {
            self.write_bits(0, 32);
            value -= 32;
        }
        self.write_bits(1, value as u32 + 1);
    }

    /// Write a folded residual with Rice parameter `k`
    pub fn write_rice(&mut self, folded: u64, k: u32) {
        self.write_unary(folded >> k);
        self.write_bits(folded, k);
    }

    /// Pad with zero bits up to the next byte boundary
    pub fn align(&mut self) {
        if self.pending > 0 {
            self.write_bits(0, 8 - self.pending);
        }
    }

    #[cfg(test)]
    pub fn is_aligned(&self) -> bool {
        self.pending == 0
    }

    /// Total number of bits written so far
    pub fn bit_len(&self) -> u64 {
        self.bytes.len() as u64 * 8 + u64::from(self.pending)
    }

    /// Completed bytes; excludes any pending partial byte
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Finish, padding a trailing partial byte with zeros
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align();
        self.bytes
    }
}
