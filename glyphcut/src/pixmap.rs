//! 32-bit BGRA pixel buffers.

use bytemuck::{Pod, Zeroable};
use image::{DynamicImage, RgbaImage};

/// A single pixel, stored in BGRA byte order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Bgra8 {
    /// Blue component.
    pub b: u8,
    /// Green component.
    pub g: u8,
    /// Red component.
    pub r: u8,
    /// Alpha component.
    pub a: u8,
}

impl Bgra8 {
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    /// Create an opaque color from its red, green and blue components.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    /// The sum of the red, green and blue components, between 0 and 765.
    #[inline]
    pub fn luminance_sum(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }

    /// Complement the color components, keeping alpha.
    #[inline]
    #[must_use]
    pub fn inverted(self) -> Self {
        Self {
            b: 255 - self.b,
            g: 255 - self.g,
            r: 255 - self.r,
            a: self.a,
        }
    }
}

/// A pixmap of BGRA8 values, stored row-major without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    /// Width of the pixmap in pixels.
    width: u32,
    /// Height of the pixmap in pixels.
    height: u32,
    buf: Vec<Bgra8>,
}

impl Pixmap {
    /// Create a new pixmap filled with `color`.
    pub fn new(width: u32, height: u32, color: Bgra8) -> Self {
        let buf = vec![color; width as usize * height as usize];
        Self { width, height, buf }
    }

    /// Create a pixmap from existing pixels.
    ///
    /// Returns `None` if the number of pixels doesn't match the dimensions.
    pub fn from_pixels(width: u32, height: u32, buf: Vec<Bgra8>) -> Option<Self> {
        (buf.len() == width as usize * height as usize).then_some(Self { width, height, buf })
    }

    /// Convert a decoded image of any pixel format to BGRA8.
    ///
    /// Formats without alpha channel become fully opaque, formats with more
    /// than 8 bits per channel are scaled down.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let buf = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                Bgra8 { b, g, r, a }
            })
            .collect();

        Self { width, height, buf }
    }

    /// Convert the pixmap into an RGBA image, for example to save it as PNG.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let data = self
            .buf
            .iter()
            .flat_map(|p| [p.r, p.g, p.b, p.a])
            .collect();

        // The buffer always has `width * height * 4` bytes.
        RgbaImage::from_raw(self.width, self.height, data)
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    /// Return the width of the pixmap.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Return the height of the pixmap.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The pixel at the given position, if it is inside of the pixmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Bgra8> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some(self.buf[y as usize * self.width as usize + x as usize])
    }

    /// One row of pixels.
    ///
    /// Panics if `y` is out of bounds.
    pub fn row(&self, y: u32) -> &[Bgra8] {
        let start = y as usize * self.width as usize;
        &self.buf[start..start + self.width as usize]
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [Bgra8] {
        let start = y as usize * self.width as usize;
        &mut self.buf[start..start + self.width as usize]
    }

    /// The pixels in row-major order.
    pub fn data(&self) -> &[Bgra8] {
        &self.buf
    }

    /// The pixels in row-major order, as `[b, g, r, a]` bytes.
    pub fn data_as_u8_slice(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buf)
    }

    /// Mutable access to the pixels in row-major order, as `[b, g, r, a]` bytes.
    pub fn data_as_u8_slice_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.buf)
    }

    /// Invert the red, green and blue components of every pixel in place.
    ///
    /// Alpha is left untouched, so inverting twice restores the original.
    pub fn invert(&mut self) {
        for pixel in &mut self.buf {
            *pixel = pixel.inverted();
        }
    }
}
