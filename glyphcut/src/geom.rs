//! Integer geometry: points, polygons and rectangles in pixel space.

use crate::ExtractError;
use core::fmt;
use core::str::FromStr;

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    /// The x coordinate.
    pub x: i32,
    /// The y coordinate.
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// A closed polygon. The last point is implicitly connected to the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create a polygon from its points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// The points of the polygon.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the polygon has no points at all.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The edges of the polygon, including the closing one.
    pub(crate) fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let next = self.points.iter().cycle().skip(1);
        self.points.iter().copied().zip(next.copied())
    }

    /// The axis-aligned bounding rectangle of all points.
    ///
    /// The width and height are the distances between the extreme coordinates,
    /// so a polygon whose points are collinear on an axis yields a zero-area
    /// rectangle. Returns `None` for an empty polygon.
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);

        for p in &self.points[1..] {
            x0 = x0.min(p.x);
            y0 = y0.min(p.y);
            x1 = x1.max(p.x);
            y1 = y1.max(p.y);
        }

        Some(Rect::new(x0, y0, x0.abs_diff(x1), y0.abs_diff(y1)))
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<T: IntoIterator<Item = Point>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromStr for Polygon {
    type Err = ExtractError;

    /// Parse a list of `x,y` pairs separated by whitespace, as in
    /// `"10,12 30,12 30,40"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_ascii_whitespace().map(parse_point).collect()
    }
}

fn parse_point(token: &str) -> Result<Point, ExtractError> {
    let malformed = || ExtractError::MalformedCoordinates {
        token: token.to_string(),
    };

    let (x, y) = token.split_once(',').ok_or_else(malformed)?;
    let x = x.parse().map_err(|_| malformed())?;
    let y = y.parse().map_err(|_| malformed())?;

    Ok(Point::new(x, y))
}

/// An axis-aligned rectangle in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    /// The x coordinate of the left edge.
    pub x: i32,
    /// The y coordinate of the top edge.
    pub y: i32,
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The exclusive right edge.
    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// The exclusive bottom edge.
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// The intersection with another rectangle.
    ///
    /// Disjoint rectangles intersect in an empty rectangle positioned at the
    /// clamped origin.
    pub fn intersect(&self, other: &Self) -> Self {
        let x0 = (self.x as i64).max(other.x as i64);
        let y0 = (self.y as i64).max(other.y as i64);
        let x1 = self.right().min(other.right()).max(x0);
        let y1 = self.bottom().min(other.bottom()).max(y0);

        Self::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32)
    }

    /// Whether `other` lies completely inside of this rectangle.
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.x, self.y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon(points: &[(i32, i32)]) -> Polygon {
        points.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn parse_points() {
        let parsed: Polygon = "2,2 8,2  8,8\t2,8\n".parse().unwrap();
        assert_eq!(parsed, polygon(&[(2, 2), (8, 2), (8, 8), (2, 8)]));

        let parsed: Polygon = "-3,4 5,-6".parse().unwrap();
        assert_eq!(parsed, polygon(&[(-3, 4), (5, -6)]));

        assert!("".parse::<Polygon>().unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_malformed_tokens() {
        for input in ["1,2 3", "1,2 3,x", "1.5,2", "1,2,3", ",4"] {
            match input.parse::<Polygon>() {
                Err(ExtractError::MalformedCoordinates { .. }) => {}
                other => panic!("expected malformed coordinates for {input:?}, got {other:?}"),
            }
        }

        let Err(ExtractError::MalformedCoordinates { token }) = "1,2 3,x".parse::<Polygon>()
        else {
            panic!("expected an error");
        };
        assert_eq!(token, "3,x");
    }

    #[test]
    fn bounding_box_of_extrema() {
        let triangle = polygon(&[(5, 1), (9, 7), (2, 4)]);
        assert_eq!(triangle.bounding_box(), Some(Rect::new(2, 1, 7, 6)));

        let collinear = polygon(&[(3, 3), (3, 5), (3, 9)]);
        let rect = collinear.bounding_box().unwrap();
        assert_eq!(rect, Rect::new(3, 3, 0, 6));
        assert!(rect.is_empty());

        assert_eq!(Polygon::default().bounding_box(), None);
    }

    #[test]
    fn edges_are_closed() {
        let triangle = polygon(&[(0, 0), (4, 0), (0, 4)]);
        let edges: Vec<_> = triangle.edges().collect();

        assert_eq!(edges.len(), 3);
        assert_eq!(edges[2], (Point::new(0, 4), Point::new(0, 0)));
    }

    #[test]
    fn intersection() {
        let page = Rect::new(0, 0, 10, 10);

        assert_eq!(page.intersect(&Rect::new(-2, 3, 5, 20)), Rect::new(0, 3, 3, 7));
        assert!(page.intersect(&Rect::new(20, 20, 4, 4)).is_empty());
        assert!(page.contains_rect(&Rect::new(2, 2, 8, 8)));
        assert!(!page.contains_rect(&Rect::new(2, 2, 9, 8)));
    }
}
