//! Driving the pipeline for every glyph of a page.

use crate::bitmap::{Bitmap, quantize};
use crate::crop::crop;
use crate::error::{ExtractError, Warning};
use crate::geom::{Polygon, Rect};
use crate::mask::mask;
use crate::page::{GlyphRecord, read_glyphs};
use crate::pixmap::{Bgra8, Pixmap};
use crate::tiff::{self, Compression, Resolution, WriteMode};
use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Settings for extracting glyphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSettings {
    /// Whether to invert the colors of a glyph before thresholding, so that
    /// dark ink ends up as black pixels.
    pub invert_colors: bool,
    /// The compression of the output files.
    pub compression: Compression,
    /// How rows are passed to the compressor.
    pub write_mode: WriteMode,
    /// The resolution stored in the output files.
    pub resolution: Resolution,
    /// The color of pixels outside of the glyph outline.
    pub background: Bgra8,
    /// Whether to process glyphs in parallel.
    pub parallel: bool,
    /// The extension of the output files, without the leading dot.
    pub extension: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            invert_colors: true,
            compression: Compression::CcittGroup4,
            write_mode: WriteMode::Scanline,
            resolution: Resolution::default(),
            background: Bgra8::WHITE,
            parallel: true,
            extension: "tif".to_string(),
        }
    }
}

impl ExtractSettings {
    fn encode_settings(&self) -> tiff::EncodeSettings {
        tiff::EncodeSettings {
            compression: self.compression,
            write_mode: self.write_mode,
            resolution: self.resolution,
        }
    }
}

/// A glyph that went through the raster pipeline.
#[derive(Debug, Clone)]
pub struct GlyphImage {
    /// The thresholded pixels.
    pub bitmap: Bitmap,
    /// The region of the page the glyph was cut from.
    pub region: Rect,
    /// Conditions that were recovered from on the way.
    pub warnings: Vec<Warning>,
}

/// Cut the glyph outlined by `polygon` out of `source` and threshold it.
///
/// The pixels outside of the outline become the background color. If the
/// bounding box of the outline has no area, the returned bitmap is empty.
pub fn process_glyph(
    source: &Pixmap,
    polygon: &Polygon,
    settings: &ExtractSettings,
) -> Result<GlyphImage, ExtractError> {
    let masked = mask(source, polygon, settings.background)?;

    // `mask` rejects polygons with less than 3 points.
    let bbox = polygon
        .bounding_box()
        .ok_or(ExtractError::InvalidPolygon { points: 0 })?;

    let mut cropped = crop(&masked, bbox);

    if settings.invert_colors {
        cropped.pixmap.invert();
    }

    Ok(GlyphImage {
        bitmap: quantize(&cropped.pixmap),
        region: cropped.region,
        warnings: cropped.warning.into_iter().collect(),
    })
}

/// Why a glyph didn't produce a file, without that being an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The glyph covers no pixels, because its points are collinear or it
    /// lies outside of the page.
    EmptyRegion(Rect),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRegion(rect) => write!(f, "region {rect} is empty"),
        }
    }
}

/// What happened to a single glyph.
#[derive(Debug)]
pub enum GlyphStatus {
    /// The image was written to the given path.
    Written(PathBuf),
    /// There was nothing to write.
    Skipped(SkipReason),
    /// The glyph could not be processed. No file was written.
    Failed(ExtractError),
}

/// The result of processing one glyph.
#[derive(Debug)]
pub struct GlyphOutcome {
    /// The identifier of the glyph.
    pub id: String,
    /// What happened.
    pub status: GlyphStatus,
    /// Conditions that were recovered from.
    pub warnings: Vec<Warning>,
}

/// The outcomes of all glyphs of a page, in document order.
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// One outcome per glyph.
    pub outcomes: Vec<GlyphOutcome>,
}

impl ExtractReport {
    /// The number of files that were written.
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, GlyphStatus::Written(_)))
    }

    /// The number of glyphs that were skipped.
    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, GlyphStatus::Skipped(_)))
    }

    /// The number of glyphs that failed.
    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, GlyphStatus::Failed(_)))
    }

    fn count(&self, f: impl Fn(&GlyphStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| f(&o.status)).count()
    }
}

/// Extracts the glyphs of one page image into a folder.
#[derive(Debug)]
pub struct Extractor<'a> {
    source: &'a Pixmap,
    base_name: String,
    out_dir: PathBuf,
    settings: ExtractSettings,
}

impl<'a> Extractor<'a> {
    /// Create a new extractor.
    ///
    /// Output files are named `{base_name}_{id}.{extension}`. The folder has
    /// to exist.
    pub fn new(
        source: &'a Pixmap,
        base_name: impl Into<String>,
        out_dir: impl Into<PathBuf>,
        settings: ExtractSettings,
    ) -> Self {
        Self {
            source,
            base_name: base_name.into(),
            out_dir: out_dir.into(),
            settings,
        }
    }

    /// The path the image of the glyph with the given id is written to.
    ///
    /// Path separators in the id are replaced so that the file always ends
    /// up in the output folder.
    pub fn output_path(&self, id: &str) -> PathBuf {
        let id: String = id
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();

        self.out_dir
            .join(format!("{}_{id}.{}", self.base_name, self.settings.extension))
    }

    /// Process all glyphs of a page.
    ///
    /// Failures are isolated per glyph and recorded in the report.
    pub fn extract_page(&self, glyphs: Vec<GlyphRecord>) -> ExtractReport {
        let outcomes = if self.settings.parallel {
            glyphs
                .into_par_iter()
                .map(|glyph| self.extract_glyph(glyph))
                .collect()
        } else {
            glyphs
                .into_iter()
                .map(|glyph| self.extract_glyph(glyph))
                .collect()
        };

        ExtractReport { outcomes }
    }

    /// Process a single glyph and write its image.
    pub fn extract_glyph(&self, glyph: GlyphRecord) -> GlyphOutcome {
        let GlyphRecord { id, polygon, .. } = glyph;

        let mut warnings = vec![];
        let status = match polygon.and_then(|p| self.write_glyph(&id, &p, &mut warnings)) {
            Ok(status) => status,
            Err(e) => {
                warn!("glyph `{id}` failed: {e}");
                GlyphStatus::Failed(e)
            }
        };

        GlyphOutcome {
            id,
            status,
            warnings,
        }
    }

    fn write_glyph(
        &self,
        id: &str,
        polygon: &Polygon,
        warnings: &mut Vec<Warning>,
    ) -> Result<GlyphStatus, ExtractError> {
        let image = process_glyph(self.source, polygon, &self.settings)?;
        warnings.extend(image.warnings);

        if image.bitmap.is_empty() {
            warn!("skipping glyph `{id}`: region {} is empty", image.region);
            return Ok(GlyphStatus::Skipped(SkipReason::EmptyRegion(image.region)));
        }

        let bytes = tiff::encode(&image.bitmap, &self.settings.encode_settings())?;
        let path = self.output_path(id);
        write_atomic(&path, &bytes)?;

        debug!(
            "wrote glyph `{id}` ({}x{}) to {}",
            image.bitmap.width(),
            image.bitmap.height(),
            path.display()
        );

        Ok(GlyphStatus::Written(path))
    }
}

/// Decode the page image at `path`.
pub fn load_source(path: &Path) -> Result<Pixmap, ExtractError> {
    let image = image::open(path).map_err(|source| ExtractError::SourceImageUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Pixmap::from_image(&image))
}

/// Extract all glyphs described by the page document at `page_path` from
/// the image at `image_path` into `out_dir`.
///
/// Fails only if the image or the page document can't be read or the output
/// folder doesn't exist. Problems with single glyphs end up in the report.
pub fn run(
    image_path: &Path,
    page_path: &Path,
    out_dir: &Path,
    settings: ExtractSettings,
) -> Result<ExtractReport, ExtractError> {
    if !out_dir.is_dir() {
        return Err(ExtractError::MissingOutputFolder(out_dir.to_path_buf()));
    }

    let glyphs = read_glyphs(page_path)?;
    let source = load_source(image_path)?;

    debug!(
        "loaded {}x{} source image with {} glyphs",
        source.width(),
        source.height(),
        glyphs.len()
    );

    let base_name = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let extractor = Extractor::new(&source, base_name, out_dir, settings);
    let report = extractor.extract_page(glyphs);

    info!(
        "{} glyphs written, {} skipped, {} failed",
        report.written(),
        report.skipped(),
        report.failed()
    );

    Ok(report)
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A temporary file that is removed when dropped, unless it was persisted.
struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    fn beside(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);

        Self {
            path: path.with_file_name(format!(".{name}.{n}.part")),
            persisted: false,
        }
    }

    fn persist(mut self, path: &Path) -> io::Result<()> {
        fs::rename(&self.path, path)?;
        self.persisted = true;

        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// Write `bytes` to `path` so that the file either appears complete or not
/// at all.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp = TempFile::beside(path);

    {
        let mut file = File::create(&temp.path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    temp.persist(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Point;

    fn square_page() -> Pixmap {
        let mut source = Pixmap::new(10, 10, Bgra8::WHITE);
        for y in 2..8 {
            source.row_mut(y)[2..8].fill(Bgra8::BLACK);
        }

        source
    }

    fn polygon(points: &[(i32, i32)]) -> Polygon {
        points.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn dark_ink_becomes_set_bits() {
        let source = square_page();
        let square = polygon(&[(2, 2), (8, 2), (8, 8), (2, 8)]);

        let image = process_glyph(&source, &square, &ExtractSettings::default()).unwrap();
        assert_eq!(image.region, Rect::new(2, 2, 6, 6));
        assert!(image.bitmap.all_set());
        assert!(image.warnings.is_empty());

        let settings = ExtractSettings {
            invert_colors: false,
            ..ExtractSettings::default()
        };
        let image = process_glyph(&source, &square, &settings).unwrap();
        assert!(image.bitmap.none_set());
    }

    #[test]
    fn background_is_cleared() {
        // A triangle cut out of a black page. Everything outside of it is
        // white background and thus unset after inversion.
        let source = Pixmap::new(8, 8, Bgra8::BLACK);
        let triangle = polygon(&[(0, 0), (6, 0), (0, 6)]);

        let image = process_glyph(&source, &triangle, &ExtractSettings::default()).unwrap();
        assert_eq!(image.bitmap.width(), 6);
        assert!(image.bitmap.get(0, 0));
        assert!(image.bitmap.get(0, 5));
        assert!(!image.bitmap.get(5, 5));
    }

    #[test]
    fn out_of_bounds_glyph_warns() {
        let source = square_page();
        let polygon = polygon(&[(6, 6), (14, 6), (14, 14)]);

        let image = process_glyph(&source, &polygon, &ExtractSettings::default()).unwrap();
        assert_eq!(image.region, Rect::new(6, 6, 4, 4));
        assert_eq!(image.warnings.len(), 1);
    }

    #[test]
    fn output_names() {
        let source = square_page();
        let extractor = Extractor::new(&source, "page", "/out", ExtractSettings::default());

        assert_eq!(extractor.output_path("g1"), Path::new("/out/page_g1.tif"));
        assert_eq!(extractor.output_path(""), Path::new("/out/page_.tif"));
        assert_eq!(
            extractor.output_path("../a\\b"),
            Path::new("/out/page_.._a_b.tif")
        );
    }

    #[test]
    fn report_counts() {
        let source = square_page();
        let extractor = Extractor::new(&source, "page", "/nonexistent", ExtractSettings::default());

        let report = extractor.extract_page(vec![
            GlyphRecord {
                id: "line".to_string(),
                label: None,
                polygon: Ok(polygon(&[(1, 1), (4, 1), (8, 1)])),
            },
            GlyphRecord {
                id: "garbled".to_string(),
                label: None,
                polygon: Err(ExtractError::MalformedCoordinates {
                    token: "x".to_string(),
                }),
            },
            GlyphRecord {
                id: "two".to_string(),
                label: None,
                polygon: Ok(polygon(&[(1, 1), (4, 4)])),
            },
        ]);

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.written(), 0);
        let ids: Vec<_> = report.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["line", "garbled", "two"]);
        assert!(matches!(
            report.outcomes[1].status,
            GlyphStatus::Failed(ExtractError::MalformedCoordinates { .. })
        ));
        assert!(matches!(
            report.outcomes[2].status,
            GlyphStatus::Failed(ExtractError::InvalidPolygon { points: 2 })
        ));
    }
}
