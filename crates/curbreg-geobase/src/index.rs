//! # Uniform Grid Index
//!
//! Each segment is registered in every cell its bounding box touches. A
//! radius query visits the cells covered by the query square and returns
//! candidate indices, sorted and deduplicated. Candidates are a superset:
//! the matcher still measures the true perpendicular distance.

use std::collections::HashMap;

use curbreg_core::{BoundingBox, Point};

use crate::error::GeobaseError;

/// Bucketed index of segment positions in the geobase vector.
#[derive(Debug, Clone)]
pub struct SegmentGrid {
    cell_m: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SegmentGrid {
    /// Empty grid with square cells of `cell_m` metres.
    pub fn new(cell_m: f64) -> Result<Self, GeobaseError> {
        if !(cell_m.is_finite() && cell_m > 0.0) {
            return Err(GeobaseError::InvalidCellSize(cell_m));
        }
        Ok(Self {
            cell_m,
            cells: HashMap::new(),
        })
    }

    /// Cell edge length in metres.
    pub fn cell_size(&self) -> f64 {
        self.cell_m
    }

    /// Register `index` in every cell overlapped by `bbox`.
    pub fn insert(&mut self, index: usize, bbox: &BoundingBox) {
        let (min_cx, min_cy) = self.cell_of(bbox.min_x, bbox.min_y);
        let (max_cx, max_cy) = self.cell_of(bbox.max_x, bbox.max_y);
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Candidate indices whose cells intersect the square of half-side
    /// `radius` around `center`.
    pub fn query(&self, center: Point, radius: f64) -> Vec<usize> {
        let (min_cx, min_cy) = self.cell_of(center.x - radius, center.y - radius);
        let (max_cx, max_cy) = self.cell_of(center.x + radius, center.y + radius);

        let mut result = Vec::new();
        for cy in min_cy..=max_cy {
            for cx in min_cx..=max_cx {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    result.extend_from_slice(bucket);
                }
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn cell_of(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.cell_m).floor() as i64,
            (y / self.cell_m).floor() as i64,
        )
    }
}
