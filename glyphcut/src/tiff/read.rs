use super::{Compression, Resolution, field_type, tag};
use crate::bitmap::Bitmap;
use core::fmt;
use glyphcut_ccitt::{DecodeError, DecodeSettings, Decoder};

/// An error that occurred while reading a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// The data doesn't start with a little-endian TIFF header.
    NotTiff,
    /// The data ended unexpectedly.
    UnexpectedEof,
    /// A required tag is missing.
    MissingTag(u16),
    /// The image uses features other than a single strip of bi-level data.
    UnsupportedLayout,
    /// The compression scheme is not supported.
    UnsupportedCompression(u16),
    /// The strip data is shorter than the image.
    StripTooShort,
    /// The CCITT data is corrupt.
    Decode(DecodeError),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotTiff => write!(f, "not a little-endian TIFF file"),
            Self::UnexpectedEof => write!(f, "unexpected end of data"),
            Self::MissingTag(tag) => write!(f, "missing required tag {tag}"),
            Self::UnsupportedLayout => write!(f, "unsupported image layout"),
            Self::UnsupportedCompression(c) => write!(f, "unsupported compression {c}"),
            Self::StripTooShort => write!(f, "strip is too short for the image"),
            Self::Decode(e) => write!(f, "failed to decode CCITT data: {e}"),
        }
    }
}

impl core::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for ReadError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// The fields of the first image of a TIFF file, along with its strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffInfo {
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Samples per pixel.
    pub samples_per_pixel: u16,
    /// The raw value of the `Compression` tag.
    pub compression: u16,
    /// The photometric interpretation.
    pub photometric: u16,
    /// The fill order.
    pub fill_order: u16,
    /// Rows per strip.
    pub rows_per_strip: u32,
    /// The T6 options, if present.
    pub t6_options: Option<u32>,
    /// The resolution, if both directions are present.
    pub resolution: Option<Resolution>,
    /// The offset of the strip in the file.
    pub strip_offset: u32,
    /// The bytes of the strip.
    pub strip: Vec<u8>,
}

impl TiffInfo {
    /// Decompress the strip into a bitmap with tightly packed rows.
    pub fn decode(&self) -> Result<Bitmap, ReadError> {
        if self.bits_per_sample != 1 || self.samples_per_pixel != 1 {
            return Err(ReadError::UnsupportedLayout);
        }

        let row_len = Bitmap::min_stride(self.width);
        let len = row_len * self.height as usize;

        let data = match Compression::from_tag_value(self.compression) {
            Some(Compression::None) => self
                .strip
                .get(..len)
                .ok_or(ReadError::StripTooShort)?
                .to_vec(),
            Some(Compression::CcittGroup4) => {
                let mut sink = PackedRows {
                    data: Vec::with_capacity(len),
                };

                glyphcut_ccitt::decode(
                    &self.strip,
                    &mut sink,
                    &DecodeSettings {
                        columns: self.width,
                        rows: self.height,
                        end_of_block: true,
                    },
                )?;

                sink.data
            }
            None => return Err(ReadError::UnsupportedCompression(self.compression)),
        };

        Bitmap::from_raw(self.width, self.height, row_len, data).ok_or(ReadError::StripTooShort)
    }
}

struct PackedRows {
    data: Vec<u8>,
}

impl Decoder for PackedRows {
    fn push_byte(&mut self, byte: u8) {
        self.data.push(byte);
    }

    fn push_bytes(&mut self, byte: u8, count: usize) {
        self.data.extend(core::iter::repeat_n(byte, count));
    }

    fn next_line(&mut self) {}
}

/// Read the first image of a little-endian TIFF file.
pub fn read(data: &[u8]) -> Result<TiffInfo, ReadError> {
    let mut reader = Reader::new(data);

    if reader.read_bytes(2) != Some(b"II") || reader.read_u16() != Some(42) {
        return Err(ReadError::NotTiff);
    }

    let ifd_offset = reader.read_u32().ok_or(ReadError::UnexpectedEof)?;
    reader.jump(ifd_offset as usize);

    let count = reader.read_u16().ok_or(ReadError::UnexpectedEof)?;
    let mut fields = Fields::default();

    for _ in 0..count {
        let entry = read_entry(&mut reader).ok_or(ReadError::UnexpectedEof)?;
        fields.apply(data, entry)?;
    }

    let width = fields.width.ok_or(ReadError::MissingTag(tag::IMAGE_WIDTH))?;
    let height = fields
        .height
        .ok_or(ReadError::MissingTag(tag::IMAGE_LENGTH))?;
    let strip_offset = fields
        .strip_offset
        .ok_or(ReadError::MissingTag(tag::STRIP_OFFSETS))?;
    let strip_len = fields
        .strip_len
        .ok_or(ReadError::MissingTag(tag::STRIP_BYTE_COUNTS))?;
    let photometric = fields
        .photometric
        .ok_or(ReadError::MissingTag(tag::PHOTOMETRIC))?;
    let rows_per_strip = fields.rows_per_strip.unwrap_or(height);

    if rows_per_strip < height {
        return Err(ReadError::UnsupportedLayout);
    }

    let strip = strip_offset
        .checked_add(strip_len)
        .and_then(|end| data.get(strip_offset as usize..end as usize))
        .ok_or(ReadError::UnexpectedEof)?
        .to_vec();

    let resolution = fields
        .x_resolution
        .zip(fields.y_resolution)
        .map(|(x, y)| Resolution { x, y });

    Ok(TiffInfo {
        width,
        height,
        bits_per_sample: fields.bits_per_sample.unwrap_or(1),
        samples_per_pixel: fields.samples_per_pixel.unwrap_or(1),
        compression: fields.compression.unwrap_or(1),
        photometric,
        fill_order: fields.fill_order.unwrap_or(1),
        rows_per_strip,
        t6_options: fields.t6_options,
        resolution,
        strip_offset,
        strip,
    })
}

#[derive(Debug, Clone, Copy)]
struct RawEntry {
    tag: u16,
    field_type: u16,
    count: u32,
    /// The value or offset field, still in file byte order.
    value: [u8; 4],
}

impl RawEntry {
    /// The single integer value of a `SHORT` or `LONG` entry.
    fn integer(&self) -> Result<u32, ReadError> {
        if self.count != 1 {
            return Err(ReadError::UnsupportedLayout);
        }

        match self.field_type {
            field_type::SHORT => Ok(u16::from_le_bytes([self.value[0], self.value[1]]) as u32),
            field_type::LONG => Ok(u32::from_le_bytes(self.value)),
            _ => Err(ReadError::UnsupportedLayout),
        }
    }

    fn short(&self) -> Result<u16, ReadError> {
        u16::try_from(self.integer()?).map_err(|_| ReadError::UnsupportedLayout)
    }

    /// The integral part of a `RATIONAL` entry.
    fn rational(&self, data: &[u8]) -> Result<u32, ReadError> {
        if self.field_type != field_type::RATIONAL || self.count != 1 {
            return Err(ReadError::UnsupportedLayout);
        }

        let mut reader = Reader::new(data);
        reader.jump(u32::from_le_bytes(self.value) as usize);

        let numerator = reader.read_u32().ok_or(ReadError::UnexpectedEof)?;
        let denominator = reader.read_u32().ok_or(ReadError::UnexpectedEof)?;

        numerator
            .checked_div(denominator)
            .ok_or(ReadError::UnsupportedLayout)
    }
}

#[derive(Debug, Default)]
struct Fields {
    width: Option<u32>,
    height: Option<u32>,
    bits_per_sample: Option<u16>,
    compression: Option<u16>,
    photometric: Option<u16>,
    fill_order: Option<u16>,
    strip_offset: Option<u32>,
    samples_per_pixel: Option<u16>,
    rows_per_strip: Option<u32>,
    strip_len: Option<u32>,
    x_resolution: Option<u32>,
    y_resolution: Option<u32>,
    t6_options: Option<u32>,
}

impl Fields {
    fn apply(&mut self, data: &[u8], entry: RawEntry) -> Result<(), ReadError> {
        match entry.tag {
            tag::IMAGE_WIDTH => self.width = Some(entry.integer()?),
            tag::IMAGE_LENGTH => self.height = Some(entry.integer()?),
            tag::BITS_PER_SAMPLE => self.bits_per_sample = Some(entry.short()?),
            tag::COMPRESSION => self.compression = Some(entry.short()?),
            tag::PHOTOMETRIC => self.photometric = Some(entry.short()?),
            tag::FILL_ORDER => self.fill_order = Some(entry.short()?),
            tag::STRIP_OFFSETS => self.strip_offset = Some(entry.integer()?),
            tag::SAMPLES_PER_PIXEL => self.samples_per_pixel = Some(entry.short()?),
            tag::ROWS_PER_STRIP => self.rows_per_strip = Some(entry.integer()?),
            tag::STRIP_BYTE_COUNTS => self.strip_len = Some(entry.integer()?),
            tag::X_RESOLUTION => self.x_resolution = Some(entry.rational(data)?),
            tag::Y_RESOLUTION => self.y_resolution = Some(entry.rational(data)?),
            tag::T6_OPTIONS => self.t6_options = Some(entry.integer()?),
            _ => {}
        }

        Ok(())
    }
}

fn read_entry(reader: &mut Reader<'_>) -> Option<RawEntry> {
    Some(RawEntry {
        tag: reader.read_u16()?,
        field_type: reader.read_u16()?,
        count: reader.read_u32()?,
        value: reader.read_bytes(4)?.try_into().ok()?,
    })
}

/// A little-endian byte reader.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn jump(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let bytes = self.data.get(self.pos..self.pos.checked_add(len)?)?;
        self.pos += len;

        Some(bytes)
    }

    fn read_u16(&mut self) -> Option<u16> {
        Some(u16::from_le_bytes(self.read_bytes(2)?.try_into().ok()?))
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.read_bytes(4)?.try_into().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiff::{EncodeSettings, encode};

    fn sample() -> Vec<u8> {
        let mut bitmap = Bitmap::new(9, 4);
        for x in 2..7 {
            bitmap.set(x, 1, true);
            bitmap.set(x, 2, true);
        }

        encode(&bitmap, &EncodeSettings::default()).unwrap()
    }

    #[test]
    fn rejects_other_formats() {
        assert_eq!(read(b"\x89PNG\r\n\x1a\n"), Err(ReadError::NotTiff));
        assert_eq!(read(b"MM\0*\0\0\0\x08"), Err(ReadError::NotTiff));
        assert_eq!(read(b"II"), Err(ReadError::NotTiff));
    }

    #[test]
    fn truncated_file() {
        let file = sample();
        assert_eq!(read(&file[..file.len() - 20]), Err(ReadError::UnexpectedEof));
    }

    #[test]
    fn decodes_sample() {
        let bitmap = read(&sample()).unwrap().decode().unwrap();

        assert_eq!(bitmap.width(), 9);
        assert_eq!(bitmap.height(), 4);
        assert!(bitmap.get(2, 1));
        assert!(bitmap.get(6, 2));
        assert!(!bitmap.get(7, 2));
        assert!(!bitmap.get(3, 0));
    }

    #[test]
    fn corrupt_strip_fails_to_decode() {
        let mut info = read(&sample()).unwrap();
        info.strip.truncate(1);
        assert!(matches!(info.decode(), Err(ReadError::Decode(_))));

        info.compression = 5;
        assert_eq!(info.decode(), Err(ReadError::UnsupportedCompression(5)));
    }
}
