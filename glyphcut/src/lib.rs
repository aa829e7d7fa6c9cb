/*!
Crop glyph images out of page scans and store them as bi-level TIFF files.

Given a page image and a PAGE XML document that outlines every glyph with a
polygon, this crate cuts each glyph out of the page, optionally inverts its
colors, reduces it to one bit per pixel and writes it as a CCITT Group 4
compressed TIFF file named `{page}_{glyph id}.tif`. Those files are meant as
ground truth for training and evaluating OCR engines.

Each step is available on its own:
- [`mask`](mask::mask) keeps the pixels inside of a polygon.
- [`crop`](crop::crop) cuts out its bounding box.
- [`Pixmap::invert`] complements the colors.
- [`quantize`](bitmap::quantize) thresholds the pixels into a [`Bitmap`].
- [`tiff::encode`] writes the bitmap into a TIFF file.

[`Extractor`] ties them together for all glyphs of a page, and [`run`] does
the same for files on disk.

# Example
```rust,no_run
use glyphcut::{ExtractSettings, run};
use std::path::Path;

let report = run(
    Path::new("page.png"),
    Path::new("page.xml"),
    Path::new("glyphs"),
    ExtractSettings::default(),
)
.unwrap();

println!("{} glyphs written", report.written());
```

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]

pub mod bitmap;
pub mod crop;
mod error;
mod extract;
pub mod geom;
pub mod mask;
pub mod page;
mod pixmap;
pub mod tiff;

pub use bitmap::{Bitmap, quantize};
pub use error::{ExtractError, Warning};
pub use extract::{
    ExtractReport, ExtractSettings, Extractor, GlyphImage, GlyphOutcome, GlyphStatus, SkipReason,
    load_source, process_glyph, run,
};
pub use geom::{Point, Polygon, Rect};
pub use page::{GlyphRecord, PageDocument, PageError};
pub use pixmap::{Bgra8, Pixmap};
pub use tiff::{Compression, Resolution, WriteMode};
