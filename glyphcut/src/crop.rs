//! Cutting rectangular regions out of pixmaps.

use crate::error::Warning;
use crate::geom::Rect;
use crate::pixmap::{Bgra8, Pixmap};
use log::warn;

/// The result of [`crop`].
#[derive(Debug, Clone)]
pub struct Crop {
    /// The cropped pixels.
    pub pixmap: Pixmap,
    /// The region that was actually copied.
    pub region: Rect,
    /// Set if the requested region had to be clipped to the source bounds.
    pub warning: Option<Warning>,
}

/// Copy the pixels inside of `rect` into a new pixmap.
///
/// If `rect` reaches outside of `source`, only the part inside of it is
/// copied and a [`Warning::RegionOutOfBounds`] is returned alongside. A rect
/// with zero width or height yields an empty pixmap of that size.
pub fn crop(source: &Pixmap, rect: Rect) -> Crop {
    let bounds = Rect::new(0, 0, source.width(), source.height());

    let (region, warning) = if bounds.contains_rect(&rect) {
        (rect, None)
    } else {
        let clipped = rect.intersect(&bounds);
        warn!(
            "region {rect} exceeds the {}x{} source, clipping to {clipped}",
            source.width(),
            source.height()
        );

        (
            clipped,
            Some(Warning::RegionOutOfBounds {
                requested: rect,
                clipped,
            }),
        )
    };

    let mut pixels = Vec::with_capacity(region.width as usize * region.height as usize);

    if !region.is_empty() {
        let (x0, x1) = (region.x as usize, region.right() as usize);

        for y in region.y as u32..region.bottom() as u32 {
            pixels.extend_from_slice(&source.row(y)[x0..x1]);
        }
    }

    let pixmap = Pixmap::from_pixels(region.width, region.height, pixels)
        .unwrap_or_else(|| Pixmap::new(region.width, region.height, Bgra8::WHITE));

    Crop {
        pixmap,
        region,
        warning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A pixmap where every pixel encodes its own position.
    fn numbered(width: u32, height: u32) -> Pixmap {
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| Bgra8::opaque(x as u8, y as u8, 0)))
            .collect();

        Pixmap::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn copies_the_region() {
        let source = numbered(10, 10);
        let crop = crop(&source, Rect::new(2, 3, 4, 5));

        assert!(crop.warning.is_none());
        assert_eq!(crop.pixmap.width(), 4);
        assert_eq!(crop.pixmap.height(), 5);
        assert_eq!(crop.pixmap.pixel(0, 0), Some(Bgra8::opaque(2, 3, 0)));
        assert_eq!(crop.pixmap.pixel(3, 4), Some(Bgra8::opaque(5, 7, 0)));
    }

    #[test]
    fn zero_area_region() {
        let source = numbered(10, 10);

        let crop = crop(&source, Rect::new(4, 4, 0, 3));
        assert!(crop.warning.is_none());
        assert_eq!(crop.pixmap.width(), 0);
        assert_eq!(crop.pixmap.height(), 3);
        assert!(crop.pixmap.is_empty());
    }

    #[test]
    fn out_of_bounds_region_is_clipped() {
        let source = numbered(10, 10);
        let requested = Rect::new(-2, 7, 5, 6);
        let crop = crop(&source, requested);

        assert_eq!(crop.region, Rect::new(0, 7, 3, 3));
        assert_eq!(
            crop.warning,
            Some(Warning::RegionOutOfBounds {
                requested,
                clipped: Rect::new(0, 7, 3, 3),
            })
        );
        assert_eq!(crop.pixmap.pixel(2, 2), Some(Bgra8::opaque(2, 9, 0)));
    }

    #[test]
    fn disjoint_region_is_empty() {
        let source = numbered(4, 4);
        let crop = crop(&source, Rect::new(10, 10, 3, 3));

        assert!(crop.pixmap.is_empty());
        assert!(crop.warning.is_some());
    }
}
