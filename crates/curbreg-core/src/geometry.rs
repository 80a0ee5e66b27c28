//! # Projected Geometry
//!
//! Planar points and polylines in a projected CRS (metres). The source
//! inventory and geobase are both reprojected to EPSG:32188 before they
//! reach the engine, so no geodesic math is needed here.
//!
//! Linear referencing follows the usual convention: the offset of a point
//! on a polyline is the distance travelled from the first vertex along the
//! digitized direction to the foot of its perpendicular.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Below this squared length a polyline piece is treated as a single vertex.
const DEGENERATE_PIECE_SQ: f64 = 1e-12;

/// A point in projected coordinates (metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
}

impl Point {
    /// Create a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Side of the street relative to the digitization direction of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideOfStreet {
    /// Right-hand side when walking from the first to the last vertex.
    Right,
    /// Left-hand side when walking from the first to the last vertex.
    Left,
}

impl SideOfStreet {
    /// Lowercase name, as used by CurbLR `sideOfStreet`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Right => "right",
            Self::Left => "left",
        }
    }
}

impl std::fmt::Display for SideOfStreet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum easting.
    pub min_x: f64,
    /// Minimum northing.
    pub min_y: f64,
    /// Maximum easting.
    pub max_x: f64,
    /// Maximum northing.
    pub max_y: f64,
}

impl BoundingBox {
    /// Grow the box by `margin` metres on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// Foot of the perpendicular from a point onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Distance along the polyline from its first vertex.
    pub offset: f64,
    /// Perpendicular distance from the point to the polyline.
    pub distance: f64,
    /// Side of the polyline the point lies on.
    pub side: SideOfStreet,
}

/// An open polyline with at least two finite vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Build a polyline, rejecting fewer than two vertices or non-finite
    /// coordinates. Zero-length polylines are accepted; the matcher reports
    /// them as degenerate.
    pub fn new(points: Vec<Point>) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewVertices(points.len()));
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(GeometryError::NonFinite { x: bad.x, y: bad.y });
        }
        Ok(Self { points })
    }

    /// The vertices in digitization order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Total length in metres.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in &self.points {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }

    /// Project a point onto the polyline.
    ///
    /// Every piece is tested; the closest foot wins and the first piece wins
    /// ties, so the result is deterministic for points equidistant to two
    /// pieces (e.g. at the outer corner of a bend).
    pub fn project(&self, point: Point) -> Projection {
        let mut best: Option<Projection> = None;
        let mut travelled = 0.0;

        for w in self.points.windows(2) {
            let (a, b) = (w[0], w[1]);
            let dx = b.x - a.x;
            let dy = b.y - a.y;
            let len_sq = dx * dx + dy * dy;
            let px = point.x - a.x;
            let py = point.y - a.y;

            let t = if len_sq < DEGENERATE_PIECE_SQ {
                0.0
            } else {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            };
            let cx = t * dx;
            let cy = t * dy;
            let distance = (px - cx).hypot(py - cy);
            let cross = dx * py - dy * px;
            let side = if cross > 0.0 {
                SideOfStreet::Left
            } else {
                SideOfStreet::Right
            };
            let piece_len = len_sq.sqrt();

            let candidate = Projection {
                offset: travelled + t * piece_len,
                distance,
                side,
            };
            if best.map_or(true, |b| candidate.distance < b.distance) {
                best = Some(candidate);
            }
            travelled += piece_len;
        }

        // A polyline always has at least one piece.
        best.unwrap_or(Projection {
            offset: 0.0,
            distance: self.points[0].distance(&point),
            side: SideOfStreet::Right,
        })
    }
}

impl TryFrom<Vec<Point>> for Polyline {
    type Error = GeometryError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Polyline> for Vec<Point> {
    fn from(line: Polyline) -> Self {
        line.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(coords: &[(f64, f64)]) -> Polyline {
        Polyline::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect()).unwrap()
    }

    #[test]
    fn rejects_single_vertex() {
        let err = Polyline::new(vec![Point::new(0.0, 0.0)]).unwrap_err();
        assert_eq!(err, GeometryError::TooFewVertices(1));
    }

    #[test]
    fn rejects_nan() {
        let err = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 1.0)]).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { .. }));
    }

    #[test]
    fn length_sums_pieces() {
        let l = line(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]);
        assert!((l.length() - 11.0).abs() < 1e-9);
    }

    #[test]
    fn projection_on_straight_line() {
        let l = line(&[(0.0, 0.0), (100.0, 0.0)]);
        let p = l.project(Point::new(25.0, 5.0));
        assert!((p.offset - 25.0).abs() < 1e-9);
        assert!((p.distance - 5.0).abs() < 1e-9);
        assert_eq!(p.side, SideOfStreet::Left);

        let q = l.project(Point::new(60.0, -2.0));
        assert_eq!(q.side, SideOfStreet::Right);
        assert!((q.offset - 60.0).abs() < 1e-9);
    }

    #[test]
    fn projection_clamps_beyond_ends() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let p = l.project(Point::new(-5.0, 0.0));
        assert_eq!(p.offset, 0.0);
        assert!((p.distance - 5.0).abs() < 1e-9);
        let q = l.project(Point::new(14.0, 3.0));
        assert!((q.offset - 10.0).abs() < 1e-9);
        assert!((q.distance - 5.0).abs() < 1e-9);
    }

    #[test]
    fn projection_follows_bends() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let p = l.project(Point::new(11.0, 6.0));
        assert!((p.offset - 16.0).abs() < 1e-9);
        assert!((p.distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_length_polyline_projects_to_start() {
        let l = line(&[(5.0, 5.0), (5.0, 5.0)]);
        assert_eq!(l.length(), 0.0);
        let p = l.project(Point::new(5.0, 8.0));
        assert_eq!(p.offset, 0.0);
        assert!((p.distance - 3.0).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_covers_vertices() {
        let l = line(&[(1.0, 5.0), (-3.0, 2.0), (4.0, -1.0)]);
        let b = l.bounding_box();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (-3.0, -1.0, 4.0, 5.0));
        let e = b.expand(1.0);
        assert_eq!((e.min_x, e.max_y), (-4.0, 6.0));
    }

    #[test]
    fn serde_rejects_short_polyline() {
        let result: Result<Polyline, _> = serde_json::from_str(r#"[{"x":0.0,"y":0.0}]"#);
        assert!(result.is_err());
    }
}
