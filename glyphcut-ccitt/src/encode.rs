//! Group 4 encoding.
//!
//! Every row is coded against the row above it (the first row against an
//! imaginary white row), choosing between pass, vertical and horizontal mode
//! as described in 2.2.3 of T.6.

use crate::bit_writer::BitWriter;
use crate::tables::{
    EOFB, EOFB_LEN, MAKEUP_STEP, MAX_MAKEUP, Mode, makeup_code, terminating_code,
};
use crate::{EncodeError, EncodeSettings};
use log::trace;

const WHITE: u8 = 0;

/// A streaming Group 4 encoder that consumes one packed row at a time.
///
/// Rows are packed MSB first, one bit per pixel, where a set bit is a black
/// pixel. Bytes beyond the last column and padding bits in the last byte are
/// ignored.
#[derive(Debug)]
pub struct Encoder {
    columns: usize,
    rows: u32,
    written_rows: u32,
    /// The previously coded row, one color per pixel.
    reference_line: Vec<u8>,
    /// The row currently being coded.
    coding_line: Vec<u8>,
    writer: BitWriter,
}

impl Encoder {
    /// Create a new encoder for an image with the given dimensions.
    pub fn new(settings: &EncodeSettings) -> Self {
        let columns = settings.columns as usize;

        Self {
            columns,
            rows: settings.rows,
            written_rows: 0,
            reference_line: vec![WHITE; columns],
            coding_line: vec![WHITE; columns],
            writer: BitWriter::new(),
        }
    }

    /// The number of bytes a packed row must at least hold.
    pub fn row_len(&self) -> usize {
        self.columns.div_ceil(8)
    }

    /// Encode the next row of the image.
    pub fn encode_row(&mut self, row: &[u8]) -> Result<(), EncodeError> {
        if self.written_rows >= self.rows {
            return Err(EncodeError::TooManyRows);
        }

        if row.len() < self.row_len() {
            return Err(EncodeError::RowTooShort {
                expected: self.row_len(),
                actual: row.len(),
            });
        }

        for (x, pixel) in self.coding_line.iter_mut().enumerate() {
            *pixel = (row[x / 8] >> (7 - x % 8)) & 1;
        }

        self.code_line();
        core::mem::swap(&mut self.reference_line, &mut self.coding_line);
        self.written_rows += 1;

        Ok(())
    }

    /// Terminate the block with an EOFB marker and return the encoded bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, EncodeError> {
        if self.written_rows != self.rows {
            return Err(EncodeError::IncompleteImage {
                written: self.written_rows,
                rows: self.rows,
            });
        }

        self.writer.write(EOFB, EOFB_LEN);
        trace!(
            "encoded {}x{} image into {} bits",
            self.columns,
            self.rows,
            self.writer.bit_len()
        );

        Ok(self.writer.finish())
    }

    fn code_line(&mut self) {
        let columns = self.columns;
        // `None` stands for the imaginary white element in front of the line.
        let mut a0: Option<usize> = None;
        let mut color = WHITE;

        loop {
            let a1 = next_change(&self.coding_line, a0, color);
            let b1 = find_b1(&self.reference_line, a0, color);
            let b2 = find_b2(&self.reference_line, b1);

            if b2 < a1 {
                self.write_mode(Mode::Pass);
                a0 = Some(b2);
            } else if a1.abs_diff(b1) <= 3 {
                let offset = a1 as isize - b1 as isize;
                self.write_mode(Mode::Vertical(offset as i8));
                a0 = Some(a1);
                color ^= 1;
            } else {
                let a2 = next_change(&self.coding_line, Some(a1), color ^ 1);
                let start = a0.unwrap_or(0);

                self.write_mode(Mode::Horizontal);
                self.write_run(color == WHITE, a1 - start);
                self.write_run(color != WHITE, a2 - a1);
                a0 = Some(a2);
            }

            if a0.is_some_and(|a0| a0 >= columns) {
                break;
            }
        }
    }

    fn write_mode(&mut self, mode: Mode) {
        let code = mode.code();
        self.writer.write(code.bits as u32, code.len);
    }

    fn write_run(&mut self, is_white: bool, mut len: usize) {
        while len >= MAX_MAKEUP as usize {
            let code = makeup_code(is_white, MAX_MAKEUP);
            self.writer.write(code.bits as u32, code.len);
            len -= MAX_MAKEUP as usize;
        }

        let step = MAKEUP_STEP as usize;
        if len >= step {
            let code = makeup_code(is_white, (len / step * step) as u16);
            self.writer.write(code.bits as u32, code.len);
            len %= step;
        }

        let code = terminating_code(is_white, len as u16);
        self.writer.write(code.bits as u32, code.len);
    }
}

/// The first element to the right of `a0` whose color differs from `color`,
/// or the line length if there is none.
fn next_change(line: &[u8], a0: Option<usize>, color: u8) -> usize {
    let start = a0.map_or(0, |a0| a0 + 1);

    line.iter()
        .skip(start)
        .position(|&c| c != color)
        .map_or(line.len(), |pos| start + pos)
}

/// "The first changing element on the reference line to the right of a0 and
/// of opposite color to a0."
fn find_b1(reference: &[u8], a0: Option<usize>, color: u8) -> usize {
    let (start, mut last_color) = match a0 {
        Some(a0) if a0 < reference.len() => (a0 + 1, reference[a0]),
        Some(_) => return reference.len(),
        None => (0, WHITE),
    };

    for (idx, &current) in reference.iter().enumerate().skip(start) {
        if current != last_color && current != color {
            return idx;
        }

        last_color = current;
    }

    reference.len()
}

/// "The next changing element to the right of b1, on the reference line."
fn find_b2(reference: &[u8], b1: usize) -> usize {
    let Some(&b1_color) = reference.get(b1) else {
        return reference.len();
    };

    reference[b1..]
        .iter()
        .position(|&c| c != b1_color)
        .map_or(reference.len(), |pos| b1 + pos)
}
