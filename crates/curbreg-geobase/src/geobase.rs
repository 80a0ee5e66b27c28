//! # Geobase
//!
//! Immutable reference set of road segments. Lookups by id go through a
//! `HashMap`; spatial lookups go through the grid. Nothing here mutates
//! after construction, so a `&Geobase` is shared across worker threads
//! without locking.

use std::collections::HashMap;

use curbreg_core::{Point, Segment, SegmentId};

use crate::error::GeobaseError;
use crate::index::SegmentGrid;

/// The indexed segment set.
#[derive(Debug, Clone)]
pub struct Geobase {
    segments: Vec<Segment>,
    by_id: HashMap<SegmentId, usize>,
    grid: SegmentGrid,
}

impl Geobase {
    /// Index `segments` in a grid of `cell_m` metre cells.
    ///
    /// # Errors
    ///
    /// `DuplicateSegment` if two segments share an id; `InvalidCellSize`
    /// for a non-positive cell size.
    pub fn new(segments: Vec<Segment>, cell_m: f64) -> Result<Self, GeobaseError> {
        let mut grid = SegmentGrid::new(cell_m)?;
        let mut by_id = HashMap::with_capacity(segments.len());
        for (i, seg) in segments.iter().enumerate() {
            if by_id.insert(seg.id.clone(), i).is_some() {
                return Err(GeobaseError::DuplicateSegment(seg.id.clone()));
            }
            grid.insert(i, &seg.geometry.bounding_box());
        }
        Ok(Self {
            segments,
            by_id,
            grid,
        })
    }

    /// Segment by id.
    pub fn get(&self, id: &SegmentId) -> Option<&Segment> {
        self.by_id.get(id).map(|&i| &self.segments[i])
    }

    /// Whether `id` is in the geobase.
    pub fn contains(&self, id: &SegmentId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Segments whose grid cells intersect the square of half-side
    /// `radius` around `center`.
    pub fn candidates(&self, center: Point, radius: f64) -> impl Iterator<Item = &Segment> {
        self.grid
            .query(center, radius)
            .into_iter()
            .map(move |i| &self.segments[i])
    }

    /// All segments in load order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the geobase is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
