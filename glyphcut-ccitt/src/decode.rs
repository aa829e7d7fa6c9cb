//! Group 4 decoding.

use crate::bit_reader::BitReader;
use crate::tables::{
    BLACK_STATES, EOFB, EOFB_LEN, INVALID, MODE_STATES, Mode, State, VALUE_FLAG, VALUE_MASK,
    WHITE_STATES,
};
use crate::{DecodeError, DecodeSettings, Decoder, Result};
use log::warn;
use std::iter;

impl BitReader<'_> {
    #[inline(always)]
    fn decode_run_inner(&mut self, states: &[State]) -> Result<u16> {
        let mut total: u16 = 0;
        let mut state: usize = 0;

        loop {
            let transition = if self.read_bit()? == 0 {
                states[state].on_0
            } else {
                states[state].on_1
            };

            if transition == INVALID {
                return Err(DecodeError::InvalidCode);
            } else if transition & VALUE_FLAG != 0 {
                let len = transition & VALUE_MASK;
                total = total.checked_add(len).ok_or(DecodeError::Overflow)?;

                // Anything below 64 is a terminating code. Mode ids are all
                // below 64 as well, so this works for mode decoding too.
                if len < 64 {
                    return Ok(total);
                }

                state = 0;
            } else {
                state = transition as usize;
            }
        }
    }

    #[inline(always)]
    pub(crate) fn decode_run(&mut self, is_white: bool) -> Result<u16> {
        if is_white {
            self.decode_run_inner(&WHITE_STATES)
        } else {
            self.decode_run_inner(&BLACK_STATES)
        }
    }

    #[inline(always)]
    pub(crate) fn decode_mode(&mut self) -> Result<Mode> {
        Ok(match self.decode_run_inner(&MODE_STATES)? {
            0 => Mode::Pass,
            1 => Mode::Horizontal,
            2 => Mode::Vertical(0),
            3 => Mode::Vertical(1),
            4 => Mode::Vertical(2),
            5 => Mode::Vertical(3),
            6 => Mode::Vertical(-1),
            7 => Mode::Vertical(-2),
            8 => Mode::Vertical(-3),
            _ => return Err(DecodeError::InvalidCode),
        })
    }
}

/// Accumulates pixels into bytes, MSB first, with black pixels as 1 bits.
#[derive(Default)]
struct BitPacker {
    buffer: u8,
    count: u8,
}

impl BitPacker {
    /// Push a single pixel. Returns `Some(byte)` if the buffer is now full.
    fn push(&mut self, black: bool) -> Option<u8> {
        self.buffer = (self.buffer << 1) | u8::from(black);
        self.count += 1;

        if self.count == 8 {
            let byte = self.buffer;
            self.buffer = 0;
            self.count = 0;
            Some(byte)
        } else {
            None
        }
    }

    fn has_pending(&self) -> bool {
        self.count > 0
    }

    /// Flush a partial byte, padded with zero bits.
    fn flush(&mut self) -> Option<u8> {
        if self.count > 0 {
            let padded = self.buffer << (8 - self.count);
            self.buffer = 0;
            self.count = 0;
            Some(padded)
        } else {
            None
        }
    }
}

pub(crate) fn decode_group4<T: Decoder>(
    data: &[u8],
    decoder: &mut T,
    settings: &DecodeSettings,
) -> Result<usize> {
    let mut ctx = DecoderContext::new(decoder, settings);
    let mut reader = BitReader::new(data);

    loop {
        if settings.end_of_block {
            if reader.peek_bits(EOFB_LEN) == Ok(EOFB) {
                reader.read_bits(EOFB_LEN)?;
                break;
            }
        } else if ctx.decoded_rows == settings.rows {
            break;
        }

        match reader.decode_mode()? {
            // 2.2.3.1 Pass mode. The color does not change.
            Mode::Pass => {
                let a0 = ctx.a0().unwrap_or(0);
                ctx.push_pixels(ctx.b2.checked_sub(a0).ok_or(DecodeError::Overflow)?);
                ctx.start_run();
            }
            // 2.2.3.3 Horizontal mode.
            Mode::Horizontal => {
                let a0a1 = reader.decode_run(ctx.is_white)? as usize;
                ctx.push_pixels(a0a1);
                ctx.is_white = !ctx.is_white;

                let a1a2 = reader.decode_run(ctx.is_white)? as usize;
                ctx.push_pixels(a1a2);
                ctx.is_white = !ctx.is_white;

                ctx.check_eol()?;
            }
            // 2.2.3.2 Vertical mode.
            Mode::Vertical(i) => {
                let a1 = if i >= 0 {
                    ctx.b1.checked_add(i as usize)
                } else {
                    ctx.b1.checked_sub(i.unsigned_abs() as usize)
                }
                .ok_or(DecodeError::Overflow)?;

                let a0 = ctx.a0().unwrap_or(0);

                ctx.push_pixels(a1.checked_sub(a0).ok_or(DecodeError::Overflow)?);
                ctx.is_white = !ctx.is_white;

                ctx.check_eol()?;
            }
        }
    }

    reader.align();
    Ok(reader.byte_pos())
}

struct DecoderContext<'a, T: Decoder> {
    /// The previous line, one color (0 = white, 1 = black) per pixel.
    reference_line: Vec<u8>,
    /// The line currently being decoded.
    coding_line: Vec<u8>,
    decoder: &'a mut T,
    packer: BitPacker,
    /// "The first changing element on the reference line to the right of a0 and
    /// of opposite color to a0."
    b1: usize,
    /// "The next changing element to the right of b1, on the reference line."
    b2: usize,
    /// The maximum permissible index for all variables.
    max_idx: usize,
    /// Whether the next run to be decoded is white.
    is_white: bool,
    decoded_rows: u32,
}

impl<'a, T: Decoder> DecoderContext<'a, T> {
    fn new(decoder: &'a mut T, settings: &DecodeSettings) -> Self {
        // One element of padding on the right so that `find_b1`/`find_b2` may
        // look at index `max_idx`.
        let max_idx = settings.columns as usize;

        Self {
            // "The reference line for the first coding line in a
            // page is an imaginary white line."
            reference_line: vec![0; max_idx + 1],
            coding_line: Vec::with_capacity(max_idx + 1),
            decoder,
            packer: BitPacker::default(),
            b1: max_idx,
            b2: max_idx,
            max_idx,
            is_white: true,
            decoded_rows: 0,
        }
    }

    /// The position of `a0`, or `None` while it still sits on the imaginary
    /// element before the start of the line.
    fn a0(&self) -> Option<usize> {
        if self.coding_line.is_empty() {
            None
        } else {
            Some(self.coding_line.len())
        }
    }

    fn cur_color(&self) -> u8 {
        if self.is_white { 0 } else { 1 }
    }

    fn find_b1(&mut self) {
        let target_color = self.cur_color() ^ 1;

        let (start, mut last_color) = match self.a0() {
            Some(a0) => (a0 + 1, self.reference_line[a0]),
            None => (0, 0),
        };

        self.b1 = start.min(self.max_idx);

        while self.b1 < self.max_idx {
            let current_color = self.reference_line[self.b1];

            if current_color != last_color && current_color == target_color {
                break;
            }

            last_color = current_color;
            self.b1 += 1;
        }
    }

    fn find_b2(&mut self) {
        self.b2 = self.b1;

        let b1_color = self.reference_line[self.b1];

        while self.b2 < self.max_idx && self.reference_line[self.b2] == b1_color {
            self.b2 += 1;
        }
    }

    fn start_run(&mut self) {
        self.find_b1();
        self.find_b2();
    }

    fn push_pixels(&mut self, count: usize) {
        let black = !self.is_white;
        let mut remaining = count;

        while self.packer.has_pending() && remaining > 0 {
            if let Some(byte) = self.packer.push(black) {
                self.decoder.push_byte(byte);
            }
            remaining -= 1;
        }

        let full_bytes = remaining / 8;
        if full_bytes > 0 {
            self.decoder
                .push_bytes(if black { 0xFF } else { 0x00 }, full_bytes);
            remaining %= 8;
        }

        for _ in 0..remaining {
            if let Some(byte) = self.packer.push(black) {
                self.decoder.push_byte(byte);
            }
        }

        let color = self.cur_color();
        self.coding_line.extend(iter::repeat_n(color, count));
    }

    fn check_eol(&mut self) -> Result<()> {
        if self.a0().unwrap_or(0) >= self.max_idx {
            if self.coding_line.len() != self.max_idx {
                warn!("coding line has wrong size");

                return Err(DecodeError::LineLengthMismatch);
            }

            if let Some(byte) = self.packer.flush() {
                self.decoder.push_byte(byte);
            }

            core::mem::swap(&mut self.reference_line, &mut self.coding_line);
            self.reference_line.resize(self.max_idx + 1, 0);
            self.coding_line.clear();
            self.is_white = true;
            self.decoded_rows += 1;
            self.decoder.next_line();
        }

        self.start_run();

        Ok(())
    }
}
