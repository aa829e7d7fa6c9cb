//! Single-image bi-level TIFF files.
//!
//! Images are written little-endian as one strip that spans the full height,
//! with the strip data directly following the header and the image file
//! directory at the end. Pixels are min-is-white, so a set bit is black.

mod read;
mod write;

pub use read::{ReadError, TiffInfo, read};
pub use write::{EncodeError, encode, encode_raw};

/// The compression scheme of the image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Packed rows are stored as they are.
    None,
    /// CCITT T.6 bi-level encoding.
    #[default]
    CcittGroup4,
}

impl Compression {
    /// The value of the `Compression` tag.
    pub fn tag_value(self) -> u16 {
        match self {
            Self::None => 1,
            Self::CcittGroup4 => 4,
        }
    }

    /// The compression for a value of the `Compression` tag, if supported.
    pub fn from_tag_value(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::None),
            4 => Some(Self::CcittGroup4),
            _ => None,
        }
    }
}

/// How rows are handed to the compressor.
///
/// Both modes produce identical files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Feed one row at a time, stepping through the buffer by its stride.
    #[default]
    Scanline,
    /// Feed the whole image as one block of tightly packed rows, repacking
    /// the buffer first if its stride carries extra padding.
    Strip,
}

/// The resolution of an image, in dots per inch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Horizontal resolution.
    pub x: u32,
    /// Vertical resolution.
    pub y: u32,
}

impl Resolution {
    /// The same resolution in both directions.
    pub const fn uniform(dpi: u32) -> Self {
        Self { x: dpi, y: dpi }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::uniform(96)
    }
}

/// Settings for writing a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeSettings {
    /// The compression of the strip.
    pub compression: Compression,
    /// How rows are passed to the compressor.
    pub write_mode: WriteMode,
    /// The resolution stored in the file.
    pub resolution: Resolution,
}

/// The metadata that ends up in the image file directory.
///
/// Bits per sample, samples per pixel, photometric interpretation and fill
/// order are fixed for bi-level images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
    /// The resolution in dots per inch.
    pub resolution: Resolution,
    /// The compression of the strip.
    pub compression: Compression,
}

impl ImageDescriptor {
    /// Bits per sample.
    pub const BITS_PER_SAMPLE: u16 = 1;
    /// Samples per pixel.
    pub const SAMPLES_PER_PIXEL: u16 = 1;
    /// Photometric interpretation, 0 is min-is-white.
    pub const PHOTOMETRIC: u16 = 0;
    /// Fill order, 1 is most significant bit first.
    pub const FILL_ORDER: u16 = 1;
}

pub(crate) mod tag {
    pub(crate) const NEW_SUBFILE_TYPE: u16 = 254;
    pub(crate) const IMAGE_WIDTH: u16 = 256;
    pub(crate) const IMAGE_LENGTH: u16 = 257;
    pub(crate) const BITS_PER_SAMPLE: u16 = 258;
    pub(crate) const COMPRESSION: u16 = 259;
    pub(crate) const PHOTOMETRIC: u16 = 262;
    pub(crate) const FILL_ORDER: u16 = 266;
    pub(crate) const STRIP_OFFSETS: u16 = 273;
    pub(crate) const ORIENTATION: u16 = 274;
    pub(crate) const SAMPLES_PER_PIXEL: u16 = 277;
    pub(crate) const ROWS_PER_STRIP: u16 = 278;
    pub(crate) const STRIP_BYTE_COUNTS: u16 = 279;
    pub(crate) const X_RESOLUTION: u16 = 282;
    pub(crate) const Y_RESOLUTION: u16 = 283;
    pub(crate) const PLANAR_CONFIGURATION: u16 = 284;
    pub(crate) const T6_OPTIONS: u16 = 293;
    pub(crate) const RESOLUTION_UNIT: u16 = 296;
}

pub(crate) mod field_type {
    pub(crate) const SHORT: u16 = 3;
    pub(crate) const LONG: u16 = 4;
    pub(crate) const RATIONAL: u16 = 5;
}

pub(crate) const HEADER_LEN: u32 = 8;
pub(crate) const RESOLUTION_UNIT_INCH: u16 = 2;
