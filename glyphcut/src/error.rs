//! Error and warning types for glyph extraction.

use crate::geom::Rect;
use crate::page::PageError;
use crate::tiff;
use core::fmt;
use std::io;
use std::path::PathBuf;

/// An error that occurred while extracting glyphs.
///
/// Errors that concern a single glyph (`InvalidPolygon`, `MalformedCoordinates`
/// and `EncodeFailed`, as well as `Io` while writing its file) only fail that
/// glyph. The others abort the whole run.
#[derive(Debug)]
pub enum ExtractError {
    /// The polygon has fewer than three points.
    InvalidPolygon {
        /// The number of points the polygon has.
        points: usize,
    },
    /// A coordinate token could not be parsed as an `x,y` integer pair.
    MalformedCoordinates {
        /// The offending token.
        token: String,
    },
    /// The bi-level container could not be produced.
    EncodeFailed(tiff::EncodeError),
    /// The source page image could not be read or decoded.
    SourceImageUnreadable {
        /// The path of the image.
        path: PathBuf,
        /// The underlying error.
        source: image::ImageError,
    },
    /// The page document could not be read or parsed.
    PageUnreadable(PageError),
    /// The output folder doesn't exist.
    MissingOutputFolder(PathBuf),
    /// An I/O error, for example while writing an output file.
    Io(io::Error),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPolygon { points } => {
                write!(f, "invalid polygon: {points} points, at least 3 are needed")
            }
            Self::MalformedCoordinates { token } => {
                write!(f, "malformed coordinates: `{token}` is not an `x,y` pair")
            }
            Self::EncodeFailed(e) => write!(f, "failed to encode image: {e}"),
            Self::SourceImageUnreadable { path, source } => {
                write!(f, "failed to read source image {}: {source}", path.display())
            }
            Self::PageUnreadable(e) => write!(f, "failed to read page document: {e}"),
            Self::MissingOutputFolder(path) => {
                write!(f, "output folder {} does not exist", path.display())
            }
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::EncodeFailed(e) => Some(e),
            Self::SourceImageUnreadable { source, .. } => Some(source),
            Self::PageUnreadable(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::InvalidPolygon { .. }
            | Self::MalformedCoordinates { .. }
            | Self::MissingOutputFolder(_) => None,
        }
    }
}

impl From<tiff::EncodeError> for ExtractError {
    fn from(e: tiff::EncodeError) -> Self {
        Self::EncodeFailed(e)
    }
}

impl From<PageError> for ExtractError {
    fn from(e: PageError) -> Self {
        Self::PageUnreadable(e)
    }
}

impl From<io::Error> for ExtractError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// A condition that was recovered from, but should be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// The bounding box of a glyph reaches outside of the source image and was
    /// clipped to it.
    RegionOutOfBounds {
        /// The bounding box as derived from the polygon.
        requested: Rect,
        /// The part of it that lies inside the image.
        clipped: Rect,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegionOutOfBounds { requested, clipped } => write!(
                f,
                "region {requested} is out of bounds, clipped to {clipped}"
            ),
        }
    }
}
