use super::{
    Compression, EncodeSettings, HEADER_LEN, ImageDescriptor, RESOLUTION_UNIT_INCH, WriteMode,
    field_type, tag,
};
use crate::bitmap::Bitmap;
use core::fmt;
use log::debug;
use std::borrow::Cow;

/// An error that occurred while writing a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The image has a width or height of zero.
    EmptyImage {
        /// The width in pixels.
        width: u32,
        /// The height in pixels.
        height: u32,
    },
    /// The stride is smaller than a packed row.
    StrideTooSmall {
        /// The given stride.
        stride: usize,
        /// The number of bytes a packed row needs.
        required: usize,
    },
    /// The buffer is too short for the given dimensions and stride.
    BufferTooShort {
        /// The length of the buffer.
        len: usize,
        /// The length it needs to have.
        required: usize,
    },
    /// The file would exceed the 4 GiB that 32-bit offsets can address.
    TooLarge,
    /// The compressor rejected the data.
    Codec(glyphcut_ccitt::EncodeError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyImage { width, height } => {
                write!(f, "cannot encode an empty {width}x{height} image")
            }
            Self::StrideTooSmall { stride, required } => {
                write!(f, "stride of {stride} bytes is smaller than a row ({required} bytes)")
            }
            Self::BufferTooShort { len, required } => {
                write!(f, "buffer has {len} bytes, expected at least {required}")
            }
            Self::TooLarge => write!(f, "image is too large for a TIFF file"),
            Self::Codec(e) => write!(f, "CCITT encoding failed: {e}"),
        }
    }
}

impl core::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<glyphcut_ccitt::EncodeError> for EncodeError {
    fn from(e: glyphcut_ccitt::EncodeError) -> Self {
        Self::Codec(e)
    }
}

/// Encode a bitmap into a TIFF file.
pub fn encode(bitmap: &Bitmap, settings: &EncodeSettings) -> Result<Vec<u8>, EncodeError> {
    encode_raw(
        bitmap.data(),
        bitmap.width(),
        bitmap.height(),
        bitmap.stride(),
        settings,
    )
}

/// Encode packed rows that are `stride` bytes apart into a TIFF file.
///
/// Rows are packed MSB first with a set bit denoting black. Either the whole
/// file is produced or an error is returned.
pub fn encode_raw(
    data: &[u8],
    width: u32,
    height: u32,
    stride: usize,
    settings: &EncodeSettings,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::EmptyImage { width, height });
    }

    let row_len = Bitmap::min_stride(width);

    if stride < row_len {
        return Err(EncodeError::StrideTooSmall {
            stride,
            required: row_len,
        });
    }

    // The last row doesn't need to be padded up to the stride.
    let required = stride * (height as usize - 1) + row_len;

    if data.len() < required {
        return Err(EncodeError::BufferTooShort {
            len: data.len(),
            required,
        });
    }

    let rows = Rows {
        data,
        width,
        height,
        stride,
        row_len,
    };

    let strip = match settings.write_mode {
        WriteMode::Scanline => rows.write_scanlines(settings.compression)?,
        WriteMode::Strip => rows.write_strip(settings.compression)?,
    };

    let descriptor = ImageDescriptor {
        width,
        height,
        resolution: settings.resolution,
        compression: settings.compression,
    };

    debug!(
        "encoded {width}x{height} bitmap into a strip of {} bytes",
        strip.len()
    );

    assemble(&descriptor, &strip)
}

struct Rows<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    row_len: usize,
}

impl Rows<'_> {
    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.row_len]
    }

    fn write_scanlines(&self, compression: Compression) -> Result<Vec<u8>, EncodeError> {
        match compression {
            Compression::None => {
                let mut strip = Vec::with_capacity(self.row_len * self.height as usize);

                for y in 0..self.height as usize {
                    strip.extend_from_slice(self.row(y));
                }

                Ok(strip)
            }
            Compression::CcittGroup4 => {
                let mut encoder = glyphcut_ccitt::Encoder::new(&self.ccitt_settings());

                for y in 0..self.height as usize {
                    encoder.encode_row(self.row(y))?;
                }

                Ok(encoder.finish()?)
            }
        }
    }

    fn write_strip(&self, compression: Compression) -> Result<Vec<u8>, EncodeError> {
        let packed = self.tightly_packed();

        match compression {
            Compression::None => Ok(packed.into_owned()),
            Compression::CcittGroup4 => {
                Ok(glyphcut_ccitt::encode(&packed, &self.ccitt_settings())?)
            }
        }
    }

    /// The rows without any padding between them.
    fn tightly_packed(&self) -> Cow<'_, [u8]> {
        let len = self.row_len * self.height as usize;

        if self.stride == self.row_len {
            return Cow::Borrowed(&self.data[..len]);
        }

        debug!(
            "repacking rows from a stride of {} to {} bytes",
            self.stride, self.row_len
        );

        let mut scratch = Vec::with_capacity(len);

        for y in 0..self.height as usize {
            scratch.extend_from_slice(self.row(y));
        }

        Cow::Owned(scratch)
    }

    fn ccitt_settings(&self) -> glyphcut_ccitt::EncodeSettings {
        glyphcut_ccitt::EncodeSettings {
            columns: self.width,
            rows: self.height,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Value {
    Short(u16),
    Long(u32),
    Rational(u32, u32),
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    tag: u16,
    value: Value,
}

impl Entry {
    fn short(tag: u16, value: u16) -> Self {
        Self {
            tag,
            value: Value::Short(value),
        }
    }

    fn long(tag: u16, value: u32) -> Self {
        Self {
            tag,
            value: Value::Long(value),
        }
    }

    fn rational(tag: u16, numerator: u32) -> Self {
        Self {
            tag,
            value: Value::Rational(numerator, 1),
        }
    }
}

/// The directory entries, in ascending tag order.
fn entries(descriptor: &ImageDescriptor, strip_offset: u32, strip_len: u32) -> Vec<Entry> {
    let mut entries = vec![
        Entry::long(tag::NEW_SUBFILE_TYPE, 0),
        Entry::long(tag::IMAGE_WIDTH, descriptor.width),
        Entry::long(tag::IMAGE_LENGTH, descriptor.height),
        Entry::short(tag::BITS_PER_SAMPLE, ImageDescriptor::BITS_PER_SAMPLE),
        Entry::short(tag::COMPRESSION, descriptor.compression.tag_value()),
        Entry::short(tag::PHOTOMETRIC, ImageDescriptor::PHOTOMETRIC),
        Entry::short(tag::FILL_ORDER, ImageDescriptor::FILL_ORDER),
        Entry::long(tag::STRIP_OFFSETS, strip_offset),
        Entry::short(tag::ORIENTATION, 1),
        Entry::short(tag::SAMPLES_PER_PIXEL, ImageDescriptor::SAMPLES_PER_PIXEL),
        Entry::long(tag::ROWS_PER_STRIP, descriptor.height),
        Entry::long(tag::STRIP_BYTE_COUNTS, strip_len),
        Entry::rational(tag::X_RESOLUTION, descriptor.resolution.x),
        Entry::rational(tag::Y_RESOLUTION, descriptor.resolution.y),
        Entry::short(tag::PLANAR_CONFIGURATION, 1),
    ];

    if descriptor.compression == Compression::CcittGroup4 {
        // No uncompressed mode.
        entries.push(Entry::long(tag::T6_OPTIONS, 0));
    }

    entries.push(Entry::short(tag::RESOLUTION_UNIT, RESOLUTION_UNIT_INCH));

    entries
}

/// Lay out header, strip and image file directory.
fn assemble(descriptor: &ImageDescriptor, strip: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let strip_len = u32::try_from(strip.len()).map_err(|_| EncodeError::TooLarge)?;
    let entries = entries(descriptor, HEADER_LEN, strip_len);

    // The directory has to start on a word boundary.
    let ifd_offset = HEADER_LEN
        .checked_add(strip_len)
        .and_then(|end| end.checked_add(end % 2))
        .ok_or(EncodeError::TooLarge)?;
    let ifd_len = 2 + 12 * entries.len() as u32 + 4;
    let mut extra_offset = ifd_offset
        .checked_add(ifd_len)
        .ok_or(EncodeError::TooLarge)?;

    let mut out = Vec::with_capacity(extra_offset as usize + 16);
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42_u16.to_le_bytes());
    out.extend_from_slice(&ifd_offset.to_le_bytes());
    out.extend_from_slice(strip);
    out.resize(ifd_offset as usize, 0);

    let mut extra = Vec::new();

    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());

    for entry in &entries {
        out.extend_from_slice(&entry.tag.to_le_bytes());

        match entry.value {
            Value::Short(v) => {
                out.extend_from_slice(&field_type::SHORT.to_le_bytes());
                out.extend_from_slice(&1_u32.to_le_bytes());
                out.extend_from_slice(&v.to_le_bytes());
                out.extend_from_slice(&[0, 0]);
            }
            Value::Long(v) => {
                out.extend_from_slice(&field_type::LONG.to_le_bytes());
                out.extend_from_slice(&1_u32.to_le_bytes());
                out.extend_from_slice(&v.to_le_bytes());
            }
            Value::Rational(num, den) => {
                out.extend_from_slice(&field_type::RATIONAL.to_le_bytes());
                out.extend_from_slice(&1_u32.to_le_bytes());
                out.extend_from_slice(&extra_offset.to_le_bytes());

                extra.extend_from_slice(&num.to_le_bytes());
                extra.extend_from_slice(&den.to_le_bytes());
                extra_offset = extra_offset.checked_add(8).ok_or(EncodeError::TooLarge)?;
            }
        }
    }

    // No further directories.
    out.extend_from_slice(&0_u32.to_le_bytes());
    out.extend_from_slice(&extra);

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::{Resolution, read};

    fn settings(compression: Compression, write_mode: WriteMode) -> EncodeSettings {
        EncodeSettings {
            compression,
            write_mode,
            resolution: Resolution::default(),
        }
    }

    fn checkerboard(width: u32, height: u32) -> Bitmap {
        let mut bitmap = Bitmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                bitmap.set(x, y, (x / 3 + y / 2) % 2 == 0);
            }
        }

        bitmap
    }

    #[test]
    fn header_and_strip_layout() {
        let bitmap = checkerboard(6, 6);
        let file = encode(&bitmap, &EncodeSettings::default()).unwrap();

        assert_eq!(&file[..4], b"II*\0");

        let info = read(&file).unwrap();
        assert_eq!(info.width, 6);
        assert_eq!(info.height, 6);
        assert_eq!(info.bits_per_sample, 1);
        assert_eq!(info.samples_per_pixel, 1);
        assert_eq!(info.compression, 4);
        assert_eq!(info.photometric, 0);
        assert_eq!(info.fill_order, 1);
        assert_eq!(info.rows_per_strip, 6);
        assert_eq!(info.t6_options, Some(0));
        assert_eq!(info.resolution, Some(Resolution::uniform(96)));
        assert_eq!(info.strip_offset, 8);
    }

    #[test]
    fn scanline_and_strip_mode_agree() {
        for compression in [Compression::CcittGroup4, Compression::None] {
            let bitmap = checkerboard(21, 9);

            let scanline = encode(&bitmap, &settings(compression, WriteMode::Scanline)).unwrap();
            let strip = encode(&bitmap, &settings(compression, WriteMode::Strip)).unwrap();

            assert_eq!(scanline, strip);
            assert_eq!(read(&strip).unwrap().decode().unwrap(), bitmap);
        }
    }

    #[test]
    fn padded_stride_is_repacked() {
        let bitmap = checkerboard(12, 5);

        // The same rows with a stride of 4 instead of 2 bytes.
        let mut padded = vec![0xAA; 4 * 5];
        for y in 0..5 {
            padded[y * 4..y * 4 + 2].copy_from_slice(bitmap.row(y as u32));
        }
        let padded = Bitmap::from_raw(12, 5, 4, padded).unwrap();

        for mode in [WriteMode::Scanline, WriteMode::Strip] {
            let from_padded = encode(&padded, &settings(Compression::CcittGroup4, mode)).unwrap();
            let from_tight = encode(&bitmap, &settings(Compression::CcittGroup4, mode)).unwrap();

            assert_eq!(from_padded, from_tight);
        }
    }

    #[test]
    fn uncompressed_strip_holds_the_rows() {
        let bitmap = checkerboard(10, 3);
        let file = encode(&bitmap, &settings(Compression::None, WriteMode::Strip)).unwrap();
        let info = read(&file).unwrap();

        assert_eq!(info.compression, 1);
        assert_eq!(info.t6_options, None);
        assert_eq!(info.strip, bitmap.data());
    }

    #[test]
    fn resolution_is_stored() {
        let settings = EncodeSettings {
            resolution: Resolution { x: 300, y: 150 },
            ..EncodeSettings::default()
        };
        let file = encode(&checkerboard(3, 3), &settings).unwrap();

        assert_eq!(
            read(&file).unwrap().resolution,
            Some(Resolution { x: 300, y: 150 })
        );
    }

    #[test]
    fn invalid_input() {
        let settings = EncodeSettings::default();

        assert_eq!(
            encode(&Bitmap::new(0, 5), &settings),
            Err(EncodeError::EmptyImage {
                width: 0,
                height: 5
            })
        );
        assert_eq!(
            encode_raw(&[0; 8], 20, 4, 2, &settings),
            Err(EncodeError::StrideTooSmall {
                stride: 2,
                required: 3
            })
        );
        assert_eq!(
            encode_raw(&[0; 8], 20, 4, 3, &settings),
            Err(EncodeError::BufferTooShort {
                len: 8,
                required: 12
            })
        );
    }

    #[test]
    fn unpadded_last_row_is_accepted() {
        // Four rows with a stride of 3, the last row only has its 2 bytes.
        let data = [0xFF, 0xF0, 0, 0, 0, 0, 0xFF, 0xF0, 0, 0x0F, 0xF0];
        let file = encode_raw(&data, 12, 4, 3, &EncodeSettings::default()).unwrap();
        let bitmap = read(&file).unwrap().decode().unwrap();

        assert!(bitmap.get(0, 0));
        assert!(!bitmap.get(0, 1));
        assert!(bitmap.get(11, 2));
        assert!(!bitmap.get(3, 3));
        assert!(bitmap.get(4, 3));
    }
}
