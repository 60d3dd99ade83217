//! Tracking the cell of moving points across successive positions.

use super::{location::NeighborhoodSearch, CellShape, LinearInterpolator};
use crate::{geometry::Point3, num::BFloat};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// The cell a tracked point was last found in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum CellAffinity {
    Cell(usize),
    /// The point has moved outside the bounding box of the mesh.
    LeftDomain,
}

impl CellAffinity {
    /// Returns the tracked cell, if the point is still inside the domain.
    pub fn cell(&self) -> Option<usize> {
        match *self {
            Self::Cell(cell) => Some(cell),
            Self::LeftDomain => None,
        }
    }

    pub fn has_left_domain(&self) -> bool {
        *self == Self::LeftDomain
    }
}

impl<F: BFloat, S: CellShape<N>, const N: usize> LinearInterpolator<F, S, N> {
    /// Finds the affinity of a point that is not yet tracked, using a full
    /// location search.
    pub fn initial_affinity(&self, point: &Point3<F>) -> CellAffinity {
        if self.mesh.bounds().contains(point) {
            CellAffinity::Cell(self.locate_with_tolerance(point, None, F::zero()).cell())
        } else {
            CellAffinity::LeftDomain
        }
    }

    /// Updates the affinity of a tracked point that has moved to a new position.
    ///
    /// Only the face-neighbour rings around the previous cell are searched.
    /// If none of them contains the point, the searched cell with the closest
    /// centroid is taken. A point outside the mesh bounding box gets
    /// `CellAffinity::LeftDomain`, and a point that had already left the domain
    /// is located from scratch.
    ///
    /// # Returns
    ///
    /// The new affinity, which is also written into `affinity`.
    ///
    /// # Panics
    ///
    /// If the previous cell index is out of range.
    pub fn update_cell(&self, point: &Point3<F>, affinity: &mut CellAffinity) -> CellAffinity {
        *affinity = if !self.mesh.bounds().contains(point) {
            CellAffinity::LeftDomain
        } else {
            match *affinity {
                CellAffinity::LeftDomain => self.initial_affinity(point),
                CellAffinity::Cell(previous) => {
                    match self.search_neighborhood(
                        point,
                        previous,
                        self.config.neighbor_search_depth,
                        F::zero(),
                    ) {
                        NeighborhoodSearch::Found(cell) => CellAffinity::Cell(cell),
                        NeighborhoodSearch::NotFound { closest } => CellAffinity::Cell(closest),
                    }
                }
            }
        };
        *affinity
    }
}
