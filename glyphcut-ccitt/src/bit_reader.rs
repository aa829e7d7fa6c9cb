//! Bit-level reader for CCITT encoded data streams.

use crate::{DecodeError, Result};

#[derive(Debug, Clone)]
pub(crate) struct BitReader<'a> {
    data: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    #[inline(always)]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            bit_offset: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn read_bit(&mut self) -> Result<u32> {
        let byte = *self
            .data
            .get(self.byte_pos())
            .ok_or(DecodeError::UnexpectedEof)? as u32;
        let shift = 7 - self.bit_pos();
        self.bit_offset += 1;
        Ok((byte >> shift) & 1)
    }

    #[inline(always)]
    pub(crate) fn read_bits(&mut self, num_bits: u8) -> Result<u32> {
        let mut result = 0_u32;

        for _ in 0..num_bits {
            result = (result << 1) | self.read_bit()?;
        }

        Ok(result)
    }

    #[inline(always)]
    pub(crate) fn peek_bits(&self, num_bits: u8) -> Result<u32> {
        self.clone().read_bits(num_bits)
    }

    #[inline(always)]
    pub(crate) fn align(&mut self) {
        let bit_pos = self.bit_pos();

        if bit_pos != 0 {
            self.bit_offset += 8 - bit_pos;
        }
    }

    #[inline(always)]
    pub(crate) fn byte_pos(&self) -> usize {
        self.bit_offset >> 3
    }

    #[inline(always)]
    fn bit_pos(&self) -> usize {
        self.bit_offset & 7
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_msb_first() {
        let data = [0b1010_0000, 0b1100_0000];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(3), Ok(0b101));
        assert_eq!(reader.peek_bits(5), Ok(0));
        reader.align();
        assert_eq!(reader.byte_pos(), 1);
        assert_eq!(reader.read_bits(2), Ok(0b11));
    }

    #[test]
    fn eof_is_reported() {
        let mut reader = BitReader::new(&[0xFF]);
        assert_eq!(reader.read_bits(8), Ok(0xFF));
        assert_eq!(reader.read_bit(), Err(DecodeError::UnexpectedEof));
    }
}
