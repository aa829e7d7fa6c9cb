//! A growable MSB-first bit writer.

/// Appends variable-length code words to a byte buffer.
#[derive(Debug, Default)]
pub(crate) struct BitWriter {
    data: Vec<u8>,
    /// Bits not yet flushed to `data`, right-aligned.
    acc: u32,
    /// Number of valid bits in `acc` (0-7 between calls).
    acc_len: u8,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Write the lowest `len` bits of `bits`, most significant first.
    #[inline]
    pub(crate) fn write(&mut self, bits: u32, len: u8) {
        debug_assert!(len <= 24);

        let mask = (1_u32 << len) - 1;
        self.acc = (self.acc << len) | (bits & mask);
        self.acc_len += len;

        while self.acc_len >= 8 {
            self.acc_len -= 8;
            self.data.push((self.acc >> self.acc_len) as u8);
        }

        self.acc &= (1 << self.acc_len) - 1;
    }

    /// Pad the current byte with zero bits.
    pub(crate) fn align(&mut self) {
        if self.acc_len > 0 {
            self.write(0, 8 - self.acc_len);
        }
    }

    /// The number of bits written so far.
    pub(crate) fn bit_len(&self) -> usize {
        self.data.len() * 8 + self.acc_len as usize
    }

    /// Align to a byte boundary and return the written bytes.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        self.align();
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_codes_across_bytes() {
        let mut writer = BitWriter::new();
        writer.write(0b101, 3);
        writer.write(0b00_0000_1111, 10);
        assert_eq!(writer.bit_len(), 13);
        assert_eq!(writer.finish(), vec![0b1010_0000, 0b0111_1000]);
    }

    #[test]
    fn align_on_boundary_is_noop() {
        let mut writer = BitWriter::new();
        writer.write(0xAB, 8);
        writer.align();
        assert_eq!(writer.finish(), vec![0xAB]);
    }
}
