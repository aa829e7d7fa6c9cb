use glyphcut::crop::crop;
use glyphcut::mask::mask;
use glyphcut::tiff::{self, EncodeSettings};
use glyphcut::{
    Bgra8, Compression, ExtractError, ExtractSettings, Extractor, GlyphRecord, GlyphStatus,
    Pixmap, Point, Polygon, Rect, WriteMode, process_glyph, quantize, run,
};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::PathBuf;

fn polygon(points: &[(i32, i32)]) -> Polygon {
    points.iter().copied().map(Point::from).collect()
}

/// A 10x10 white page with a 6x6 black square at (2, 2).
fn square_page() -> Pixmap {
    let pixels = (0..10)
        .flat_map(|y| {
            (0..10).map(move |x| {
                if (2..8).contains(&x) && (2..8).contains(&y) {
                    Bgra8::BLACK
                } else {
                    Bgra8::WHITE
                }
            })
        })
        .collect();

    Pixmap::from_pixels(10, 10, pixels).unwrap()
}

/// A fresh, empty directory for a single test.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("glyphcut-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    dir
}

fn page_xml(glyphs: &[(&str, &str)]) -> String {
    let glyphs: String = glyphs
        .iter()
        .map(|(id, points)| {
            format!(
                r#"<Glyph id="{id}"><Coords points="{points}"/><TextEquiv><Unicode>x</Unicode></TextEquiv></Glyph>"#
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<PcGts xmlns="http://schema.primaresearch.org/PAGE/gts/pagecontent/2010-03-19">
  <Page imageFilename="page.png" imageWidth="10" imageHeight="10">
    <TextRegion id="r0"><TextLine id="l0"><Word id="w0">{glyphs}</Word></TextLine></TextRegion>
  </Page>
</PcGts>"#
    )
}

fn write_square_png(path: &std::path::Path) {
    let image = RgbaImage::from_fn(10, 10, |x, y| {
        if (2..8).contains(&x) && (2..8).contains(&y) {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    image.save(path).unwrap();
}

#[test]
fn black_square_end_to_end() {
    let source = square_page();
    let square = polygon(&[(2, 2), (8, 2), (8, 8), (2, 8)]);

    let image = process_glyph(&source, &square, &ExtractSettings::default()).unwrap();
    assert_eq!(image.bitmap.width(), 6);
    assert_eq!(image.bitmap.height(), 6);
    assert!(image.bitmap.all_set());

    let file = tiff::encode(&image.bitmap, &EncodeSettings::default()).unwrap();
    let info = tiff::read(&file).unwrap();

    assert_eq!(info.width, 6);
    assert_eq!(info.height, 6);
    assert_eq!(info.bits_per_sample, 1);
    assert_eq!(info.compression, Compression::CcittGroup4.tag_value());
    assert_eq!(info.photometric, 0);
    assert_eq!(info.decode().unwrap(), image.bitmap);
}

#[test]
fn triangle_has_no_background_leakage() {
    let ink = Bgra8::opaque(40, 90, 160);
    let source = Pixmap::new(20, 20, ink);
    let triangle = polygon(&[(3, 4), (15, 6), (7, 17)]);

    let masked = mask(&source, &triangle, Bgra8::WHITE).unwrap();
    let bbox = triangle.bounding_box().unwrap();
    let cropped = crop(&masked, bbox);

    assert_eq!(bbox, Rect::new(3, 4, 12, 13));
    assert_eq!(cropped.pixmap.width(), bbox.width);
    assert_eq!(cropped.pixmap.height(), bbox.height);

    // The top left vertex and the row above the bottom vertex.
    assert_eq!(cropped.pixmap.pixel(0, 0), Some(ink));
    assert_eq!(cropped.pixmap.pixel(4, 12), Some(ink));

    // Every pixel is either ink or background, and the area right of the
    // left edge at the vertical center is filled.
    for &pixel in cropped.pixmap.data() {
        assert!(pixel == ink || pixel == Bgra8::WHITE);
    }
    for x in 3..10 {
        assert_eq!(cropped.pixmap.pixel(x, 6), Some(ink));
    }
}

#[test]
fn scanline_and_strip_files_decode_identically() {
    let source = square_page();
    let glyph = polygon(&[(1, 1), (9, 3), (6, 9), (1, 7)]);
    let bitmap = process_glyph(&source, &glyph, &ExtractSettings::default())
        .unwrap()
        .bitmap;

    let decode = |write_mode| {
        let settings = EncodeSettings {
            write_mode,
            ..EncodeSettings::default()
        };
        let file = tiff::encode(&bitmap, &settings).unwrap();
        tiff::read(&file).unwrap().decode().unwrap()
    };

    assert_eq!(decode(WriteMode::Scanline), decode(WriteMode::Strip));
    assert_eq!(decode(WriteMode::Strip), bitmap);
}

#[test]
fn threshold_boundary() {
    let pixels = vec![Bgra8::opaque(100, 200, 200), Bgra8::opaque(101, 200, 200)];
    let bitmap = quantize(&Pixmap::from_pixels(2, 1, pixels).unwrap());

    assert!(!bitmap.get(0, 0));
    assert!(bitmap.get(1, 0));
}

#[test]
fn degenerate_polygons() {
    let source = square_page();
    let settings = ExtractSettings::default();

    match process_glyph(&source, &polygon(&[(1, 1), (5, 5)]), &settings) {
        Err(ExtractError::InvalidPolygon { points: 2 }) => {}
        other => panic!("expected an invalid polygon, got {other:?}"),
    }

    // Collinear on a diagonal still has a bounding box with area.
    let diagonal = polygon(&[(1, 1), (3, 3), (5, 5)]);
    let image = process_glyph(&source, &diagonal, &settings).unwrap();
    assert!(!image.bitmap.is_empty());

    let vertical = polygon(&[(4, 1), (4, 3), (4, 8)]);
    let image = process_glyph(&source, &vertical, &settings).unwrap();
    assert_eq!(image.region, Rect::new(4, 1, 0, 7));
    assert!(image.bitmap.is_empty());
}

#[test]
fn run_writes_one_file_per_glyph() {
    let dir = temp_dir("run");
    let out = dir.join("out");
    fs::create_dir(&out).unwrap();

    let image_path = dir.join("page.png");
    let page_path = dir.join("page.xml");
    write_square_png(&image_path);
    fs::write(
        &page_path,
        page_xml(&[
            ("g1", "2,2 8,2 8,8 2,8"),
            ("g2", "1,1 1,5 1,9"),
            ("g3", "1,1 2,x 3,3"),
            ("g/4", "0,0 4,0 4,4 0,4"),
        ]),
    )
    .unwrap();

    let report = run(&image_path, &page_path, &out, ExtractSettings::default()).unwrap();

    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.written(), 2);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 1);

    let GlyphStatus::Written(path) = &report.outcomes[0].status else {
        panic!("expected g1 to be written");
    };
    assert_eq!(path, &out.join("page_g1.tif"));

    let info = tiff::read(&fs::read(path).unwrap()).unwrap();
    assert_eq!((info.width, info.height), (6, 6));
    assert!(info.decode().unwrap().all_set());

    assert!(out.join("page_g_4.tif").is_file());
    assert_eq!(report.outcomes[2].id, "g3");
    assert!(matches!(
        report.outcomes[2].status,
        GlyphStatus::Failed(ExtractError::MalformedCoordinates { .. })
    ));

    let mut names: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["page_g1.tif", "page_g_4.tif"]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn sequential_and_uncompressed_run() {
    let dir = temp_dir("sequential");
    let image_path = dir.join("scan.png");
    let page_path = dir.join("scan.xml");
    write_square_png(&image_path);
    fs::write(&page_path, page_xml(&[("a", "2,2 8,2 8,8 2,8")])).unwrap();

    let settings = ExtractSettings {
        compression: Compression::None,
        write_mode: WriteMode::Strip,
        parallel: false,
        invert_colors: false,
        extension: "tiff".to_string(),
        ..ExtractSettings::default()
    };
    let report = run(&image_path, &page_path, &dir, settings).unwrap();
    assert_eq!(report.written(), 1);

    let info = tiff::read(&fs::read(dir.join("scan_a.tiff")).unwrap()).unwrap();
    assert_eq!(info.compression, 1);
    assert!(info.decode().unwrap().none_set());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn fatal_errors() {
    let dir = temp_dir("fatal");
    let image_path = dir.join("page.png");
    let page_path = dir.join("page.xml");
    fs::write(&page_path, page_xml(&[("g1", "2,2 8,2 8,8 2,8")])).unwrap();

    // No image yet.
    match run(&image_path, &page_path, &dir, ExtractSettings::default()) {
        Err(ExtractError::SourceImageUnreadable { .. }) => {}
        other => panic!("expected an unreadable image, got {other:?}"),
    }

    write_square_png(&image_path);

    match run(&image_path, &dir.join("missing.xml"), &dir, ExtractSettings::default()) {
        Err(ExtractError::PageUnreadable(_)) => {}
        other => panic!("expected an unreadable page, got {other:?}"),
    }

    match run(&image_path, &page_path, &dir.join("out"), ExtractSettings::default()) {
        Err(ExtractError::MissingOutputFolder(_)) => {}
        other => panic!("expected a missing output folder, got {other:?}"),
    }

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn failed_write_leaves_no_file_behind() {
    let dir = temp_dir("failed-write");
    let source = square_page();

    // A directory in place of the output file makes the final rename fail.
    fs::create_dir(dir.join("page_g1.tif")).unwrap();

    let extractor = Extractor::new(&source, "page", &dir, ExtractSettings::default());
    let outcome = extractor.extract_glyph(GlyphRecord {
        id: "g1".to_string(),
        label: None,
        polygon: Ok(polygon(&[(2, 2), (8, 2), (8, 8), (2, 8)])),
    });

    assert!(matches!(outcome.status, GlyphStatus::Failed(ExtractError::Io(_))));

    let entries: Vec<_> = fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["page_g1.tif"]);
    assert!(dir.join("page_g1.tif").is_dir());

    fs::remove_dir_all(&dir).unwrap();
}
