//! 1-bit-per-pixel images and the conversion from 32-bit pixmaps.

use crate::pixmap::Pixmap;

/// Pixels whose red, green and blue components sum up to more than this
/// value become set bits.
pub const THRESHOLD: u16 = 500;

/// A bi-level image, packed 8 pixels per byte with the most significant bit
/// first. Every row starts at a multiple of `stride` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Create a new bitmap with all bits cleared and the minimal stride.
    pub fn new(width: u32, height: u32) -> Self {
        let stride = Self::min_stride(width);

        Self {
            width,
            height,
            stride,
            data: vec![0; stride * height as usize],
        }
    }

    /// Create a bitmap from packed rows that are `stride` bytes apart.
    ///
    /// Returns `None` if the stride is too small for the width or the data
    /// too short for the height.
    pub fn from_raw(width: u32, height: u32, stride: usize, data: Vec<u8>) -> Option<Self> {
        if stride < Self::min_stride(width) || data.len() < stride * height as usize {
            return None;
        }

        Some(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// The number of bytes needed to hold a row of `width` pixels.
    pub fn min_stride(width: u32) -> usize {
        width.div_ceil(8) as usize
    }

    /// The width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The distance between the starts of two rows, in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The underlying packed data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The bytes of one row, including padding up to the stride.
    ///
    /// Panics if `y` is out of bounds.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// Whether the pixel at the given position is set.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        self.row(y)[x as usize / 8] & (0x80 >> (x % 8)) != 0
    }

    /// Set or clear the pixel at the given position. Out-of-bounds positions
    /// are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = y as usize * self.stride + x as usize / 8;
        let mask = 0x80 >> (x % 8);

        if value {
            self.data[idx] |= mask;
        } else {
            self.data[idx] &= !mask;
        }
    }

    /// Whether every pixel is set.
    pub fn all_set(&self) -> bool {
        (0..self.height).all(|y| (0..self.width).all(|x| self.get(x, y)))
    }

    /// Whether no pixel is set.
    pub fn none_set(&self) -> bool {
        (0..self.height).all(|y| (0..self.width).all(|x| !self.get(x, y)))
    }
}

/// Convert a pixmap into a bitmap by thresholding.
///
/// A pixel becomes a set bit if the sum of its red, green and blue
/// components is greater than [`THRESHOLD`]; alpha is ignored. Rows use the
/// minimal stride and unused bits in the last byte of a row stay cleared.
pub fn quantize(pixmap: &Pixmap) -> Bitmap {
    let mut bitmap = Bitmap::new(pixmap.width(), pixmap.height());

    if bitmap.is_empty() {
        return bitmap;
    }

    let stride = bitmap.stride;

    for (y, out) in bitmap.data.chunks_exact_mut(stride).enumerate() {
        for (byte, pixels) in out.iter_mut().zip(pixmap.row(y as u32).chunks(8)) {
            *byte = pixels
                .iter()
                .enumerate()
                .filter(|(_, p)| p.luminance_sum() > THRESHOLD)
                .fold(0, |acc, (i, _)| acc | (0x80 >> i));
        }
    }

    bitmap
}
