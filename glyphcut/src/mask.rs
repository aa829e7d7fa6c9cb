//! Polygon masking.
//!
//! The polygon is scan-converted row by row: for every pixel row, the
//! crossings of all non-horizontal edges with the row are collected and the
//! spans between them are filled according to the fill rule. Pixels that lie
//! exactly on an edge are always part of the polygon, which also covers
//! horizontal edges and the bottom-most vertices that the half-open crossing
//! test leaves out.

use crate::geom::{Point, Polygon};
use crate::pixmap::{Bgra8, Pixmap};
use crate::ExtractError;
use smallvec::SmallVec;

/// The rule that decides which regions of a self-intersecting polygon are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    /// A point is inside if a ray from it crosses the outline an odd number of times.
    #[default]
    EvenOdd,
    /// A point is inside if the outline winds around it at least once.
    NonZero,
}

/// A crossing of an edge with a pixel row.
#[derive(Debug, Clone, Copy)]
struct Crossing {
    x: f64,
    /// `1` for downward edges, `-1` for upward ones.
    winding: i32,
}

/// Keep the pixels of `source` that lie inside of or on `polygon` and replace
/// all other ones with `background`, using the even-odd rule.
///
/// The returned pixmap has the same dimensions as `source`.
pub fn mask(source: &Pixmap, polygon: &Polygon, background: Bgra8) -> Result<Pixmap, ExtractError> {
    mask_with_rule(source, polygon, background, FillRule::EvenOdd)
}

/// Like [`mask`], but with an explicit fill rule.
pub fn mask_with_rule(
    source: &Pixmap,
    polygon: &Polygon,
    background: Bgra8,
    fill_rule: FillRule,
) -> Result<Pixmap, ExtractError> {
    if polygon.len() < 3 {
        return Err(ExtractError::InvalidPolygon {
            points: polygon.len(),
        });
    }

    let mut masked = Pixmap::new(source.width(), source.height(), background);

    let Some(bbox) = polygon.bounding_box() else {
        return Ok(masked);
    };

    if source.is_empty() {
        return Ok(masked);
    }

    let max_y = source.height() as i64 - 1;
    let first_row = (bbox.y as i64).max(0);
    let last_row = bbox.bottom().min(max_y);

    let mut crossings: SmallVec<[Crossing; 8]> = SmallVec::new();

    for y in first_row..=last_row {
        collect_crossings(polygon, y, &mut crossings);

        for (start, end) in spans(&crossings, fill_rule) {
            copy_span(source, &mut masked, y as u32, start.ceil(), end.floor());
        }
    }

    for (p0, p1) in polygon.edges() {
        for (x, y) in lattice_points(p0, p1, source.width(), source.height()) {
            masked.row_mut(y)[x as usize] = source.row(y)[x as usize];
        }
    }

    Ok(masked)
}

/// Collect the sorted crossings of all edges with the row `y`.
///
/// An edge covers the rows from its upper end point up to, but excluding,
/// its lower one, so that a vertex shared by two edges is counted once.
fn collect_crossings(polygon: &Polygon, y: i64, crossings: &mut SmallVec<[Crossing; 8]>) {
    crossings.clear();

    for (p0, p1) in polygon.edges() {
        if p0.y == p1.y {
            continue;
        }

        let (top, bottom, winding) = if p0.y < p1.y {
            (p0, p1, 1)
        } else {
            (p1, p0, -1)
        };

        if y < top.y as i64 || y >= bottom.y as i64 {
            continue;
        }

        let dx = bottom.x as i64 - top.x as i64;
        let dy = bottom.y as i64 - top.y as i64;
        // Coordinates span the whole `i32` range, so the product needs 128 bits.
        let x = top.x as f64 + ((y - top.y as i64) as i128 * dx as i128) as f64 / dy as f64;

        crossings.push(Crossing { x, winding });
    }

    crossings.sort_unstable_by(|a, b| a.x.total_cmp(&b.x));
}

/// The inside spans of a row, as pairs of crossing positions.
fn spans(crossings: &[Crossing], fill_rule: FillRule) -> SmallVec<[(f64, f64); 4]> {
    let mut spans = SmallVec::new();

    match fill_rule {
        FillRule::EvenOdd => {
            for pair in crossings.chunks_exact(2) {
                spans.push((pair[0].x, pair[1].x));
            }
        }
        FillRule::NonZero => {
            let mut winding = 0;
            let mut start = 0.0;

            for crossing in crossings {
                let was_inside = winding != 0;
                winding += crossing.winding;

                match (was_inside, winding != 0) {
                    (false, true) => start = crossing.x,
                    (true, false) => spans.push((start, crossing.x)),
                    _ => {}
                }
            }
        }
    }

    spans
}

fn copy_span(source: &Pixmap, masked: &mut Pixmap, y: u32, start: f64, end: f64) {
    let max_x = source.width() as f64 - 1.0;
    let start = start.max(0.0);
    let end = end.min(max_x);

    if start > end {
        return;
    }

    let (start, end) = (start as usize, end as usize);
    masked.row_mut(y)[start..=end].copy_from_slice(&source.row(y)[start..=end]);
}

/// All integer points on the segment from `p0` to `p1`, including both ends,
/// that lie inside of a `width` x `height` image.
fn lattice_points(
    p0: Point,
    p1: Point,
    width: u32,
    height: u32,
) -> impl Iterator<Item = (u32, u32)> {
    let dx = p1.x as i64 - p0.x as i64;
    let dy = p1.y as i64 - p0.y as i64;
    let steps = gcd(dx.unsigned_abs(), dy.unsigned_abs()).max(1) as i64;
    let (step_x, step_y) = (dx / steps, dy / steps);

    let (x0, y0) = (p0.x as i64, p0.y as i64);
    let along_x = step_range(x0, step_x, width as i64 - 1);
    let along_y = step_range(y0, step_y, height as i64 - 1);

    let (first, last) = match (along_x, along_y) {
        (Some((a0, a1)), Some((b0, b1))) => (a0.max(b0).max(0), a1.min(b1).min(steps)),
        _ => (1, 0),
    };

    (first..=last).map(move |k| ((x0 + k * step_x) as u32, (y0 + k * step_y) as u32))
}

/// The range of `k` for which `start + k * step` lies in `0..=max`.
fn step_range(start: i64, step: i64, max: i64) -> Option<(i64, i64)> {
    if step == 0 {
        return (0..=max).contains(&start).then_some((i64::MIN, i64::MAX));
    }

    // Mirror a descending walk so that the step is always positive.
    let (start, step) = if step < 0 {
        (max - start, -step)
    } else {
        (start, step)
    };

    let first = -start.div_euclid(step);
    let last = (max - start).div_euclid(step);

    (first <= last).then_some((first, last))
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }

    a
}
