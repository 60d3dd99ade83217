//! Precomputed per-cell barycentric coordinate geometry.

use super::CellShape;
use crate::{
    geometry::{Dim3::*, Point3},
    mesh::Mesh,
    num::{from_usize, BFloat},
};
use rayon::prelude::*;

/// Coefficients of a linear function of homogeneous coordinates `(x, y, z, 1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cofactors<F>(pub [F; 4]);

impl<F: BFloat> Cofactors<F> {
    /// Evaluates the linear function at the given point.
    pub fn evaluate(&self, point: &Point3<F>) -> F {
        let c = &self.0;
        c[0] * point[X] + c[1] * point[Y] + c[2] * point[Z] + c[3]
    }
}

/// Geometry of a single cell needed for point location and interpolation.
#[derive(Clone, Debug)]
pub struct CellGeometry<F: BFloat, const N: usize> {
    main: F,
    cofactors: [Cofactors<F>; N],
    centroid: Point3<F>,
    degenerate: bool,
}

impl<F: BFloat, const N: usize> CellGeometry<F, N> {
    /// Returns the main determinant, which is proportional to the cell volume
    /// for tetrahedra and to the squared area for triangles.
    pub fn main_determinant(&self) -> F {
        self.main
    }

    pub fn centroid(&self) -> &Point3<F> {
        &self.centroid
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Computes the barycentric weights of the point. For degenerate cells
    /// every node gets the same weight.
    pub fn weights(&self, point: &Point3<F>) -> [F; N] {
        if self.degenerate {
            let weight = from_usize::<F>(N).recip();
            [weight; N]
        } else {
            let inverse_main = self.main.recip();
            std::array::from_fn(|node| self.cofactors[node].evaluate(point) * inverse_main)
        }
    }

    /// Returns the smallest barycentric weight of the point, or `None` for
    /// degenerate cells.
    pub fn min_weight(&self, point: &Point3<F>) -> Option<F> {
        if self.degenerate {
            return None;
        }
        let inverse_main = self.main.recip();
        self.cofactors
            .iter()
            .map(|cofactors| cofactors.evaluate(point) * inverse_main)
            .reduce(F::min)
    }

    /// Whether every barycentric weight of the point lies within
    /// `[-tolerance, 1 + tolerance]`. Degenerate cells contain no points.
    pub fn contains(&self, point: &Point3<F>, tolerance: F) -> bool {
        if self.degenerate {
            return false;
        }
        let zero = -tolerance;
        let one = F::one() + tolerance;
        let inverse_main = self.main.recip();
        self.cofactors.iter().all(|cofactors| {
            let weight = cofactors.evaluate(point) * inverse_main;
            weight >= zero && weight <= one
        })
    }
}

/// Computes the geometry of every cell in the mesh in parallel.
///
/// A cell is flagged as degenerate when the magnitude of its main determinant
/// does not exceed `degeneracy_tolerance` times the mean magnitude over all cells.
pub fn precompute_cell_geometry<F, S, const N: usize>(
    mesh: &Mesh<F, N>,
    degeneracy_tolerance: F,
) -> Vec<CellGeometry<F, N>>
where
    F: BFloat,
    S: CellShape<N>,
{
    let mut geometry: Vec<_> = (0..mesh.n_cells())
        .into_par_iter()
        .map(|cell| {
            let vertices = mesh.cell_vertices(cell);
            let (main, cofactors) = S::compute_cofactors(&vertices);
            CellGeometry {
                main,
                cofactors,
                centroid: Point3::centroid_of(&vertices),
                degenerate: false,
            }
        })
        .collect();

    let mean_abs_main = geometry.iter().map(|cell| cell.main.abs()).sum::<F>()
        / from_usize(geometry.len());
    let threshold = degeneracy_tolerance * mean_abs_main;

    geometry.par_iter_mut().for_each(|cell| {
        cell.degenerate = !cell.main.is_normal() || cell.main.abs() <= threshold;
    });
    geometry
}
