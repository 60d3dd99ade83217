//! Piecewise linear interpolation of node solutions on simplex meshes.

pub mod affinity;
pub mod barycentric;
pub mod location;
pub mod tetrahedron;
pub mod triangle;

use self::barycentric::{CellGeometry, Cofactors};
use crate::{
    geometry::{Point3, Vec3},
    io::Verbosity,
    mesh::Mesh,
    num::{from_f64, BFloat},
};
use rayon::prelude::*;
use std::{fmt, marker::PhantomData, sync::Arc};

#[cfg(feature = "serialization")]
use serde::Serialize;

pub use self::{
    affinity::CellAffinity, location::CellLocation, tetrahedron::Tetrahedron, triangle::Triangle,
};

/// Floating-point precision to use for configuration values.
#[allow(non_camel_case_types)]
pub type fip = f64;

/// Interpolation engine for tetrahedral meshes.
pub type TetrahedronInterpolator<F> = LinearInterpolator<F, Tetrahedron, 4>;

/// Interpolation engine for triangular surface meshes.
pub type TriangleInterpolator<F> = LinearInterpolator<F, Triangle, 3>;

/// The field values attached to a node or sampled at a point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Solution<F> {
    pub vector: Vec3<F>,
    pub norm: F,
    pub scalar: F,
}

impl<F: BFloat> Solution<F> {
    /// Creates a new solution with the norm computed from the given vector.
    pub fn new(vector: Vec3<F>, scalar: F) -> Self {
        let norm = vector.length();
        Self {
            vector,
            norm,
            scalar,
        }
    }

    /// Creates a solution with only a vector part.
    pub fn from_vector(vector: Vec3<F>) -> Self {
        Self::new(vector, F::zero())
    }

    /// Creates a solution with only a scalar part.
    pub fn from_scalar(scalar: F) -> Self {
        Self::new(Vec3::zero(), scalar)
    }

    /// Creates a solution with every channel set to the given value.
    pub fn filled(value: F) -> Self {
        Self {
            vector: Vec3::equal_components(value),
            norm: value,
            scalar: value,
        }
    }

    pub fn zero() -> Self {
        Self::filled(F::zero())
    }

    /// Whether any channel has reached the given sentinel magnitude.
    pub fn is_sentinel(&self, sentinel_magnitude: F) -> bool {
        SolutionChannel::all()
            .iter()
            .any(|&channel| self.channel(channel).abs() >= sentinel_magnitude)
    }

    /// Returns the value of the given channel.
    pub fn channel(&self, channel: SolutionChannel) -> F {
        use crate::geometry::Dim3::{X, Y, Z};
        match channel {
            SolutionChannel::VectorX => self.vector[X],
            SolutionChannel::VectorY => self.vector[Y],
            SolutionChannel::VectorZ => self.vector[Z],
            SolutionChannel::Norm => self.norm,
            SolutionChannel::Scalar => self.scalar,
        }
    }
}

/// One of the scalar channels making up a `Solution`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolutionChannel {
    VectorX,
    VectorY,
    VectorZ,
    Norm,
    Scalar,
}

impl SolutionChannel {
    /// Creates an array for iterating over all channels.
    pub fn all() -> [Self; 5] {
        [
            Self::VectorX,
            Self::VectorY,
            Self::VectorZ,
            Self::Norm,
            Self::Scalar,
        ]
    }
}

impl fmt::Display for SolutionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::VectorX => "vector x-component",
                Self::VectorY => "vector y-component",
                Self::VectorZ => "vector z-component",
                Self::Norm => "vector norm",
                Self::Scalar => "scalar",
            }
        )
    }
}

/// How to fill in the solution for a point that no cell contains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlocatedPolicy {
    /// Substitute the error sentinel in every channel.
    Sentinel,
    /// Extrapolate linearly from the nearest cell.
    Extrapolate,
}

/// Configuration parameters for the interpolation engine.
#[derive(Clone, Debug)]
pub struct InterpolatorConfig {
    /// Slack allowed on barycentric coordinates when testing containment.
    pub search_outside_tolerance: fip,
    /// Number of face-neighbour rings to search around the guess cell.
    pub neighbor_search_depth: usize,
    /// Cells with a main determinant smaller than this fraction of the mean
    /// absolute main determinant are considered degenerate.
    pub degeneracy_tolerance: fip,
    /// Magnitude marking a solution channel as invalid.
    pub error_sentinel_magnitude: fip,
    /// Number of samples per histogram bin when detecting outliers.
    pub histogram_bin_divisor: usize,
    /// Neighbourhood radius for replacing outliers. Radii below
    /// `MIN_CLEANING_CUTOFF_RADIUS` disable cleaning.
    pub cleaning_cutoff_radius: fip,
    pub unlocated_policy: UnlocatedPolicy,
}

impl InterpolatorConfig {
    pub const DEFAULT_SEARCH_OUTSIDE_TOLERANCE: fip = 0.1;
    pub const DEFAULT_NEIGHBOR_SEARCH_DEPTH: usize = 2;
    pub const DEFAULT_DEGENERACY_TOLERANCE: fip = 1e-10;
    pub const DEFAULT_ERROR_SENTINEL_MAGNITUDE: fip = 1e20;
    pub const DEFAULT_HISTOGRAM_BIN_DIVISOR: usize = 250;
    pub const DEFAULT_CLEANING_CUTOFF_RADIUS: fip = 0.0;
    pub const MIN_CLEANING_CUTOFF_RADIUS: fip = 0.1;

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        assert!(
            self.search_outside_tolerance >= 0.0,
            "Search outside tolerance must be non-negative."
        );
        assert!(
            self.degeneracy_tolerance >= 0.0,
            "Degeneracy tolerance must be non-negative."
        );
        assert!(
            self.error_sentinel_magnitude > 0.0,
            "Error sentinel magnitude must be larger than zero."
        );
        assert!(
            self.histogram_bin_divisor > 0,
            "Histogram bin divisor must be larger than zero."
        );
        assert!(
            self.cleaning_cutoff_radius >= 0.0,
            "Cleaning cutoff radius must be non-negative."
        );
    }

    /// Whether the cutoff radius is large enough for outlier cleaning to run.
    pub fn cleaning_enabled(&self) -> bool {
        self.cleaning_cutoff_radius >= Self::MIN_CLEANING_CUTOFF_RADIUS
    }
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        InterpolatorConfig {
            search_outside_tolerance: Self::DEFAULT_SEARCH_OUTSIDE_TOLERANCE,
            neighbor_search_depth: Self::DEFAULT_NEIGHBOR_SEARCH_DEPTH,
            degeneracy_tolerance: Self::DEFAULT_DEGENERACY_TOLERANCE,
            error_sentinel_magnitude: Self::DEFAULT_ERROR_SENTINEL_MAGNITUDE,
            histogram_bin_divisor: Self::DEFAULT_HISTOGRAM_BIN_DIVISOR,
            cleaning_cutoff_radius: Self::DEFAULT_CLEANING_CUTOFF_RADIUS,
            unlocated_policy: UnlocatedPolicy::Sentinel,
        }
    }
}

/// Defines the properties of a simplex cell shape with `N` nodes.
pub trait CellShape<const N: usize>: Clone + Copy + fmt::Debug + Sync + Send {
    /// Code identifying the cell type in VTK files.
    const VTK_CELL_TYPE: u8;

    /// Human readable name of the cell type.
    const NAME: &'static str;

    /// Computes the barycentric coefficients of a cell.
    ///
    /// # Parameters
    ///
    /// - `vertices`: Positions of the cell nodes.
    ///
    /// # Returns
    ///
    /// A tuple containing:
    ///
    /// - `F`: The main determinant of the cell.
    /// - `[Cofactors<F>; N]`: For each node, the coefficients that give the node's
    ///   barycentric weight times the main determinant when dotted with `(x, y, z, 1)`.
    ///
    /// # Type parameters
    ///
    /// - `F`: Floating point type of the coordinates.
    fn compute_cofactors<F: BFloat>(vertices: &[Point3<F>; N]) -> (F, [Cofactors<F>; N]);
}

/// Linear interpolator of node solutions over a mesh of `N`-node cells.
///
/// The cell geometry is precomputed once per mesh. The node solutions can be
/// replaced between queries, but not while queries are running.
#[derive(Clone, Debug)]
pub struct LinearInterpolator<F: BFloat, S: CellShape<N>, const N: usize> {
    mesh: Arc<Mesh<F, N>>,
    geometry: Vec<CellGeometry<F, N>>,
    solutions: Vec<Solution<F>>,
    config: InterpolatorConfig,
    shape: PhantomData<S>,
}

impl<F: BFloat, S: CellShape<N>, const N: usize> LinearInterpolator<F, S, N> {
    /// Creates a new interpolator, precomputing the geometry of every cell.
    ///
    /// # Panics
    ///
    /// If the number of solutions differs from the number of mesh nodes,
    /// or the configuration is invalid.
    pub fn new(
        mesh: Arc<Mesh<F, N>>,
        solutions: Vec<Solution<F>>,
        config: InterpolatorConfig,
        verbosity: &Verbosity,
    ) -> Self {
        config.validate();
        Self::validate_solutions(&mesh, &solutions);

        let geometry = barycentric::precompute_cell_geometry::<F, S, N>(
            &mesh,
            from_f64(config.degeneracy_tolerance),
        );

        if verbosity.print_messages() {
            let n_degenerate = geometry.par_iter().filter(|cell| cell.is_degenerate()).count();
            println!(
                "Precomputed geometry for {} {} cells ({} degenerate)",
                geometry.len(),
                S::NAME,
                n_degenerate
            );
        }

        Self {
            mesh,
            geometry,
            solutions,
            config,
            shape: PhantomData,
        }
    }

    fn validate_solutions(mesh: &Mesh<F, N>, solutions: &[Solution<F>]) {
        assert_eq!(
            solutions.len(),
            mesh.n_nodes(),
            "Number of solutions differs from number of mesh nodes"
        );
    }

    /// Replaces the node solutions while keeping the cell geometry.
    ///
    /// # Panics
    ///
    /// If the number of solutions differs from the number of mesh nodes.
    pub fn set_solutions(&mut self, solutions: Vec<Solution<F>>) {
        Self::validate_solutions(&self.mesh, &solutions);
        self.solutions = solutions;
    }

    pub fn mesh(&self) -> &Mesh<F, N> {
        self.mesh.as_ref()
    }

    pub fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    pub fn solutions(&self) -> &[Solution<F>] {
        &self.solutions
    }

    /// Returns the solution at the given node.
    pub fn solution(&self, node: usize) -> &Solution<F> {
        &self.solutions[node]
    }

    pub fn vector(&self, node: usize) -> &Vec3<F> {
        &self.solutions[node].vector
    }

    pub fn scalar(&self, node: usize) -> F {
        self.solutions[node].scalar
    }

    /// Returns the precomputed geometry of the given cell.
    pub fn cell_geometry(&self, cell: usize) -> &CellGeometry<F, N> {
        &self.geometry[cell]
    }

    pub fn n_cells(&self) -> usize {
        self.geometry.len()
    }

    pub fn n_degenerate_cells(&self) -> usize {
        self.geometry
            .iter()
            .filter(|cell| cell.is_degenerate())
            .count()
    }

    /// Computes the barycentric weights of the given point with respect to the
    /// nodes of the given cell. Degenerate cells give uniform weights.
    ///
    /// # Panics
    ///
    /// If the cell index is out of range.
    pub fn barycentric_weights(&self, point: &Point3<F>, cell: usize) -> [F; N] {
        self.assert_valid_cell(cell);
        self.geometry[cell].weights(point)
    }

    /// Interpolates the full solution at the given point using the given cell.
    ///
    /// Points outside the cell are linearly extrapolated.
    ///
    /// # Panics
    ///
    /// If the cell index is out of range.
    pub fn interp_solution(&self, point: &Point3<F>, cell: usize) -> Solution<F> {
        let weights = self.barycentric_weights(point, cell);
        let nodes = self.mesh.cell_nodes(cell);

        let mut vector = Vec3::zero();
        let mut scalar = F::zero();
        for (&node, &weight) in nodes.iter().zip(weights.iter()) {
            let solution = &self.solutions[node];
            vector = vector + solution.vector * weight;
            scalar = scalar + solution.scalar * weight;
        }
        Solution::new(vector, scalar)
    }

    /// Interpolates only the vector part of the solution.
    pub fn interp_vector(&self, point: &Point3<F>, cell: usize) -> Vec3<F> {
        let weights = self.barycentric_weights(point, cell);
        self.mesh
            .cell_nodes(cell)
            .iter()
            .zip(weights.iter())
            .map(|(&node, &weight)| self.solutions[node].vector * weight)
            .sum()
    }

    /// Interpolates only the scalar part of the solution.
    pub fn interp_scalar(&self, point: &Point3<F>, cell: usize) -> F {
        let weights = self.barycentric_weights(point, cell);
        self.mesh
            .cell_nodes(cell)
            .iter()
            .zip(weights.iter())
            .map(|(&node, &weight)| self.solutions[node].scalar * weight)
            .sum()
    }

    fn assert_valid_cell(&self, cell: usize) {
        assert!(
            cell < self.geometry.len(),
            "Cell index {} outside range [0, {})",
            cell,
            self.geometry.len()
        );
    }
}


#[cfg(test)]
mod tests {
    use super::{test_interpolators::*, *};
    use crate::{geometry::Dim3::{X, Y}, mesh::test_meshes};
    use approx::assert_abs_diff_eq;

    #[test]
    fn scalar_interpolation_is_exact_at_nodes_and_centroid() {
        let interpolator = unit_tetrahedron_interpolator();
        assert_eq!(
            interpolator.interp_scalar(&Point3::new(0.0, 0.0, 0.0), 0),
            0.0
        );
        for (node, vertex) in interpolator.mesh().nodes().iter().enumerate() {
            assert_abs_diff_eq!(
                interpolator.interp_scalar(vertex, 0),
                node as f64,
                epsilon = 1e-12
            );
        }
        assert_abs_diff_eq!(
            interpolator.interp_scalar(&Point3::new(0.25, 0.25, 0.25), 0),
            1.5,
            epsilon = 1e-12
        );
    }

    #[test]
    fn linear_fields_are_reproduced() {
        let interpolator = interpolator_with_linear_solution(
            test_meshes::box_tetrahedral_mesh(2),
            InterpolatorConfig::default(),
        );
        let point = Point3::new(0.3, 0.6, 0.45);
        let cell = interpolator.locate(&point, None).cell();
        let solution = interpolator.interp_solution(&point, cell);
        let expected = linear_solution(&point);
        assert_abs_diff_eq!(solution.vector, expected.vector, epsilon = 1e-10);
        assert_abs_diff_eq!(solution.norm, expected.norm, epsilon = 1e-10);
        assert_abs_diff_eq!(solution.scalar, expected.scalar, epsilon = 1e-10);
        assert_abs_diff_eq!(
            interpolator.interp_vector(&point, cell),
            expected.vector,
            epsilon = 1e-10
        );
    }

    #[test]
    fn replaced_solutions_are_used_for_interpolation() {
        let mut interpolator = unit_tetrahedron_interpolator();
        interpolator.set_solutions(vec![Solution::from_vector(Vec3::new(0.0, 0.0, 2.0)); 4]);
        assert_eq!(interpolator.scalar(3), 0.0);
        assert_eq!(*interpolator.vector(1), Vec3::new(0.0, 0.0, 2.0));
        assert_abs_diff_eq!(
            interpolator.interp_vector(&Point3::new(0.2, 0.2, 0.2), 0),
            Vec3::new(0.0, 0.0, 2.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn triangle_interpolation_uses_projected_point() {
        let mesh = test_meshes::unit_square_triangles();
        let solutions = mesh
            .nodes()
            .iter()
            .map(|node| Solution::from_scalar(node[X] + 2.0 * node[Y]))
            .collect();
        let interpolator = TriangleInterpolator::new(
            Arc::new(mesh),
            solutions,
            InterpolatorConfig::default(),
            &Verbosity::Quiet,
        );
        for cell in 0..interpolator.n_cells() {
            for &node in interpolator.mesh().cell_nodes(cell) {
                let vertex = &interpolator.mesh().nodes()[node];
                assert_abs_diff_eq!(
                    interpolator.interp_scalar(vertex, cell),
                    interpolator.scalar(node),
                    epsilon = 1e-12
                );
            }
        }
        let point = Point3::new(0.6, 0.3, 0.05);
        let cell = interpolator.locate(&point, None).cell();
        assert_eq!(cell, 0);
        assert_abs_diff_eq!(interpolator.interp_scalar(&point, cell), 1.2, epsilon = 1e-12);
    }

    #[test]
    fn weights_form_partition_of_unity() {
        let interpolator = unit_tetrahedron_interpolator();
        let weights = interpolator.barycentric_weights(&Point3::new(0.1, 0.7, -0.3), 0);
        assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sentinel_solution_is_detected() {
        let sentinel = Solution::<f64>::filled(1e20);
        assert!(sentinel.is_sentinel(1e20));
        assert!(!Solution::from_scalar(3.0).is_sentinel(1e20));
    }

    #[test]
    #[should_panic]
    fn mismatched_solution_count_panics() {
        LinearInterpolator::<f64, Tetrahedron, 4>::new(
            Arc::new(test_meshes::unit_tetrahedron()),
            vec![Solution::zero(); 3],
            InterpolatorConfig::default(),
            &Verbosity::Quiet,
        );
    }

    #[test]
    #[should_panic]
    fn out_of_range_cell_panics() {
        let interpolator = unit_tetrahedron_interpolator();
        interpolator.interp_scalar(&Point3::origin(), 1);
    }
}
