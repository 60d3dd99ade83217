//! Locating the mesh cell containing a point.

use super::{CellShape, LinearInterpolator};
use crate::{
    geometry::Point3,
    num::{from_f64, BFloat, OrderableIndexValuePair},
};

/// Smallest margin around the mesh bounds, relative to the bounds diagonal,
/// within which points can be located.
const MIN_RELATIVE_BOUNDS_MARGIN: f64 = 1e-9;

/// Outcome of locating a point in the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellLocation {
    /// The cell contains the point within the search tolerance.
    Inside(usize),
    /// No cell contains the point. This is the cell whose centroid is closest.
    Nearest(usize),
}

impl CellLocation {
    /// Returns the index of the located cell.
    pub fn cell(&self) -> usize {
        match *self {
            Self::Inside(cell) | Self::Nearest(cell) => cell,
        }
    }

    pub fn is_inside(&self) -> bool {
        matches!(self, Self::Inside(_))
    }
}

/// Outcome of searching the face-neighbour rings around a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborhoodSearch {
    Found(usize),
    NotFound { closest: usize },
}

impl<F: BFloat, S: CellShape<N>, const N: usize> LinearInterpolator<F, S, N> {
    /// Returns the configured slack on barycentric coordinates.
    pub fn search_outside_tolerance(&self) -> F {
        from_f64(self.config.search_outside_tolerance)
    }

    /// Whether the given cell contains the point within the given tolerance.
    /// Degenerate cells never contain any point.
    ///
    /// # Panics
    ///
    /// If the cell index is out of range.
    pub fn contains_point(&self, point: &Point3<F>, cell: usize, tolerance: F) -> bool {
        self.assert_valid_cell(cell);
        self.geometry[cell].contains(point, tolerance)
    }

    /// Locates the cell containing the given point using the configured
    /// search outside tolerance.
    ///
    /// See `locate_with_tolerance`.
    pub fn locate(&self, point: &Point3<F>, guess: Option<usize>) -> CellLocation {
        self.locate_with_tolerance(point, guess, self.search_outside_tolerance())
    }

    /// Locates the cell containing the given point.
    ///
    /// The face-neighbour rings around the guess are searched for a cell that
    /// strictly contains the point, followed by a scan over all cells. Only if
    /// no cell strictly contains the point is the tolerance band used, and then
    /// the cell with the largest smallest barycentric weight is chosen. The
    /// guess therefore only affects how fast the cell is found.
    ///
    /// # Parameters
    ///
    /// - `point`: Point to locate.
    /// - `guess`: Cell to start searching from, typically the cell of a nearby
    ///   point (cell 0 is used if `None`).
    /// - `tolerance`: Slack allowed on the barycentric coordinates, so that a
    ///   point counts as inside if all coordinates are in `[-tolerance, 1 + tolerance]`.
    ///
    /// # Returns
    ///
    /// A `CellLocation` with either the containing cell or, if no cell
    /// contains the point, the cell with the closest centroid. Points outside
    /// the mesh bounds expanded by `tolerance` times the bounds diagonal are
    /// never inside.
    ///
    /// # Panics
    ///
    /// If the guess is not a valid cell index.
    pub fn locate_with_tolerance(
        &self,
        point: &Point3<F>,
        guess: Option<usize>,
        tolerance: F,
    ) -> CellLocation {
        let start = match guess {
            Some(cell) => {
                self.assert_valid_cell(cell);
                cell
            }
            None => 0,
        };
        if !self.is_within_reach(point, tolerance) {
            return CellLocation::Nearest(self.closest_centroid_cell(point));
        }
        match self.search_neighborhood(
            point,
            start,
            self.config.neighbor_search_depth,
            F::zero(),
        ) {
            NeighborhoodSearch::Found(cell) => CellLocation::Inside(cell),
            NeighborhoodSearch::NotFound { .. } => self.scan_all_cells(point, tolerance),
        }
    }

    /// Whether the point lies within the mesh bounds grown by the given
    /// tolerance times the length of the bounds diagonal.
    ///
    /// Triangle weights are computed for the projection of the point onto
    /// the cell plane, so this is what bounds the distance from the surface.
    pub fn is_within_reach(&self, point: &Point3<F>, tolerance: F) -> bool {
        let bounds = self.mesh.bounds();
        let relative_margin = tolerance.max(from_f64(MIN_RELATIVE_BOUNDS_MARGIN));
        bounds
            .expanded(relative_margin * bounds.extent().length())
            .contains(point)
    }

    /// Tests the start cell and then its face neighbours ring by ring, up to
    /// the given number of rings.
    ///
    /// If no tested cell contains the point, the tested cell with the closest
    /// centroid is reported.
    pub fn search_neighborhood(
        &self,
        point: &Point3<F>,
        start: usize,
        depth: usize,
        tolerance: F,
    ) -> NeighborhoodSearch {
        if self.contains_point(point, start, tolerance) {
            return NeighborhoodSearch::Found(start);
        }

        let mut visited = vec![start];
        let mut ring_start = 0;
        for _ in 0..depth {
            let ring_end = visited.len();
            for ring_idx in ring_start..ring_end {
                let cell = visited[ring_idx];
                for &neighbor in self.mesh.neighbors(cell).iter().flatten() {
                    if visited.contains(&neighbor) {
                        continue;
                    }
                    if self.geometry[neighbor].contains(point, tolerance) {
                        return NeighborhoodSearch::Found(neighbor);
                    }
                    visited.push(neighbor);
                }
            }
            if visited.len() == ring_end {
                break;
            }
            ring_start = ring_end;
        }

        let closest = visited
            .into_iter()
            .map(|cell| {
                OrderableIndexValuePair(
                    cell,
                    self.geometry[cell].centroid().squared_distance_to(point),
                )
            })
            .min()
            .map_or(start, |OrderableIndexValuePair(cell, _)| cell);

        NeighborhoodSearch::NotFound { closest }
    }

    fn scan_all_cells(&self, point: &Point3<F>, tolerance: F) -> CellLocation {
        let mut best_tolerated: Option<(usize, F)> = None;
        let mut nearest_cell = 0;
        let mut nearest_squared_distance = F::infinity();

        for (cell, geometry) in self.geometry.iter().enumerate() {
            if geometry.contains(point, F::zero()) {
                return CellLocation::Inside(cell);
            }
            if geometry.contains(point, tolerance) {
                if let Some(min_weight) = geometry.min_weight(point) {
                    // Ties keep the lowest cell index
                    if best_tolerated.map_or(true, |(_, best)| min_weight > best) {
                        best_tolerated = Some((cell, min_weight));
                    }
                }
            }
            let squared_distance = geometry.centroid().squared_distance_to(point);
            if squared_distance < nearest_squared_distance {
                nearest_cell = cell;
                nearest_squared_distance = squared_distance;
            }
        }
        match best_tolerated {
            Some((cell, _)) => CellLocation::Inside(cell),
            None => CellLocation::Nearest(nearest_cell),
        }
    }

    fn closest_centroid_cell(&self, point: &Point3<F>) -> usize {
        self.geometry
            .iter()
            .enumerate()
            .map(|(cell, geometry)| {
                OrderableIndexValuePair(cell, geometry.centroid().squared_distance_to(point))
            })
            .min()
            .map_or(0, |OrderableIndexValuePair(cell, _)| cell)
    }
}
