/*!
A CCITT Group 4 (T.6, also known as MMR) codec for bi-level images.

The encoder consumes packed rows one at a time and produces the compressed
bit stream terminated by an EOFB marker, ready to be stored in a TIFF strip.
The decoder turns such a bit stream back into packed rows and is mainly used
to verify encoded images.

In both directions, rows are packed MSB first with one bit per pixel, and a
set bit denotes a black pixel.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

mod bit_reader;
mod bit_writer;
mod decode;
mod encode;
mod error;
mod tables;

pub use encode::Encoder;
pub use error::{DecodeError, EncodeError, Result};

/// Settings for decoding a Group 4 bit stream.
#[derive(Copy, Clone, Debug)]
pub struct DecodeSettings {
    /// The number of pixels per row.
    pub columns: u32,
    /// The number of rows. Only used to find the end of the data if
    /// `end_of_block` is `false`.
    pub rows: u32,
    /// Whether the bit stream is terminated by an EOFB marker.
    pub end_of_block: bool,
}

/// Settings for encoding a Group 4 bit stream.
#[derive(Copy, Clone, Debug)]
pub struct EncodeSettings {
    /// The number of pixels per row.
    pub columns: u32,
    /// The number of rows.
    pub rows: u32,
}

/// A sink for decoded pixel data.
pub trait Decoder {
    /// Push a single packed byte. Each bit represents a pixel (1=black, 0=white).
    fn push_byte(&mut self, byte: u8);
    /// Push multiple copies of the same byte value (for efficient runs of same-color pixels).
    fn push_bytes(&mut self, byte: u8, count: usize);
    /// Called when a line is complete (after byte alignment).
    fn next_line(&mut self);
}

/// Decode a Group 4 bit stream into the given sink.
///
/// Returns the number of bytes that were consumed.
pub fn decode(data: &[u8], decoder: &mut impl Decoder, settings: &DecodeSettings) -> Result<usize> {
    decode::decode_group4(data, decoder, settings)
}

/// Encode a whole image of tightly packed rows, `ceil(columns / 8)` bytes each.
pub fn encode(data: &[u8], settings: &EncodeSettings) -> core::result::Result<Vec<u8>, EncodeError> {
    let mut encoder = Encoder::new(settings);
    let row_len = encoder.row_len();

    if row_len > 0 {
        for row in data.chunks(row_len).take(settings.rows as usize) {
            encoder.encode_row(row)?;
        }
    }

    // Surfaces missing rows as `IncompleteImage`.
    encoder.finish()
}
