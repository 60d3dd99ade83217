//! Sampling of interpolated solutions at batches of points.

pub mod cleaning;
pub mod sorting;
pub mod statistics;

use crate::{
    geometry::Point3,
    interpolation::{CellShape, LinearInterpolator, Solution, UnlocatedPolicy},
    io::Verbosity,
    num::{from_f64, BFloat},
};
use atomic_counter::{AtomicCounter, RelaxedCounter};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Which parts of the solution to interpolate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampledQuantity {
    /// Both the vector and the scalar.
    Solution,
    /// Only the vector, with the scalar set to zero.
    Vector,
    /// Only the scalar, with the vector set to zero.
    Scalar,
}

/// Configuration parameters for sampling a batch of points.
#[derive(Clone, Debug)]
pub struct SamplingConfig {
    pub quantity: SampledQuantity,
    /// Whether to visit the points in Hilbert curve order, so that consecutive
    /// points tend to lie in the same or adjacent cells.
    pub spatial_sorting: bool,
    /// Whether to accept points slightly outside a cell as inside it.
    pub search_outside: bool,
    /// Number of consecutive points handled by one parallel task.
    pub chunk_size: usize,
}

impl SamplingConfig {
    pub const DEFAULT_SPATIAL_SORTING: bool = true;
    pub const DEFAULT_SEARCH_OUTSIDE: bool = true;
    pub const DEFAULT_CHUNK_SIZE: usize = 256;

    /// Panics if any of the configuration parameter values are invalid.
    pub fn validate(&self) {
        assert!(self.chunk_size > 0, "Chunk size must be larger than zero.");
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            quantity: SampledQuantity::Solution,
            spatial_sorting: Self::DEFAULT_SPATIAL_SORTING,
            search_outside: Self::DEFAULT_SEARCH_OUTSIDE,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Names used for the solution channels in output files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct QuantityLabels {
    pub vector: &'static str,
    pub norm: &'static str,
    pub scalar: &'static str,
}

impl QuantityLabels {
    /// Labels for an electric field with its potential.
    pub fn electric() -> Self {
        Self {
            vector: "elfield",
            norm: "elfield_norm",
            scalar: "potential",
        }
    }

    /// Labels for a current density with the temperature.
    pub fn heat() -> Self {
        Self {
            vector: "rho",
            norm: "rho_norm",
            scalar: "temperature",
        }
    }

    pub fn generic() -> Self {
        Self {
            vector: "vec",
            norm: "vec_norm",
            scalar: "scalar",
        }
    }
}

/// A solution sampled at a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct Sample<F> {
    /// Index of the point in the original batch.
    pub id: usize,
    pub position: Point3<F>,
    /// The cell used for interpolation.
    pub cell: usize,
    /// Whether the cell contains the point.
    pub located: bool,
    pub solution: Solution<F>,
}

/// The samples for a batch of points, in the original batch order.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct SampleSet<F> {
    samples: Vec<Sample<F>>,
    labels: QuantityLabels,
}

impl<F: BFloat> SampleSet<F> {
    pub fn new(samples: Vec<Sample<F>>, labels: QuantityLabels) -> Self {
        Self { samples, labels }
    }

    pub fn samples(&self) -> &[Sample<F>] {
        &self.samples
    }

    pub fn labels(&self) -> &QuantityLabels {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the number of points that no cell contained.
    pub fn n_unlocated(&self) -> usize {
        self.samples.iter().filter(|sample| !sample.located).count()
    }

    /// Returns a list of `n_entries` solutions where entry `i` is the solution
    /// of the sample with ID `i`, or zero if there is no such sample.
    ///
    /// # Panics
    ///
    /// If any sample ID is not smaller than `n_entries`.
    pub fn solutions_by_id(&self, n_entries: usize) -> Vec<Solution<F>> {
        let mut solutions = vec![Solution::zero(); n_entries];
        for sample in &self.samples {
            assert!(
                sample.id < n_entries,
                "Sample ID {} outside range [0, {})",
                sample.id,
                n_entries
            );
            solutions[sample.id] = sample.solution;
        }
        solutions
    }
}

/// Samples the interpolated solution at every point of the given batch.
///
/// # Parameters
///
/// - `interpolator`: Interpolator holding the mesh and node solutions.
/// - `points`: Positions to sample at.
/// - `config`: Configuration parameters for the batch.
/// - `labels`: Names of the solution channels.
/// - `verbosity`: Whether and how to report status.
///
/// # Returns
///
/// A `SampleSet` with one sample per point, in the order of `points`. Points
/// that no cell contains get the error sentinel in every channel, unless the
/// interpolator is configured to extrapolate. If the interpolator has a cleaning
/// cutoff radius, outliers are replaced by neighbourhood averages.
///
/// # Type parameters
///
/// - `F`: Floating point type of the field data.
/// - `S`: Shape of the mesh cells.
/// - `N`: Number of nodes per cell.
pub fn sample_points<F, S, const N: usize>(
    interpolator: &LinearInterpolator<F, S, N>,
    points: &[Point3<F>],
    config: &SamplingConfig,
    labels: QuantityLabels,
    verbosity: &Verbosity,
) -> SampleSet<F>
where
    F: BFloat,
    S: CellShape<N>,
{
    config.validate();
    let interpolator_config = interpolator.config();

    let order: Vec<usize> = if config.spatial_sorting {
        sorting::hilbert_order(points)
    } else {
        (0..points.len()).collect()
    };

    let mut samples: Vec<_> = order
        .into_iter()
        .map(|id| Sample {
            id,
            position: points[id],
            cell: 0,
            located: false,
            solution: Solution::zero(),
        })
        .collect();

    let tolerance = if config.search_outside {
        interpolator.search_outside_tolerance()
    } else {
        F::zero()
    };
    let sentinel = Solution::filled(from_f64(interpolator_config.error_sentinel_magnitude));
    let extrapolate = interpolator_config.unlocated_policy == UnlocatedPolicy::Extrapolate;
    let n_unlocated = RelaxedCounter::new(0);

    let n_chunks = (samples.len() + config.chunk_size - 1) / config.chunk_size;

    samples
        .par_chunks_mut(config.chunk_size)
        .progress_with(verbosity.create_progress_bar(n_chunks))
        .for_each(|chunk| {
            let mut guess = None;
            for sample in chunk.iter_mut() {
                let location =
                    interpolator.locate_with_tolerance(&sample.position, guess, tolerance);
                guess = Some(location.cell());

                sample.cell = location.cell();
                sample.located = location.is_inside();
                if !sample.located {
                    n_unlocated.inc();
                }
                sample.solution = if sample.located || extrapolate {
                    interp_quantity(interpolator, &sample.position, sample.cell, config.quantity)
                } else {
                    sentinel
                };
            }
        });

    let n_unlocated = n_unlocated.get();
    if n_unlocated > 0 && verbosity.print_messages() {
        eprintln!(
            "Warning: {} of {} points were not inside any cell",
            n_unlocated,
            samples.len()
        );
    }

    if interpolator_config.cleaning_enabled() {
        cleaning::clean_all_channels(&mut samples, interpolator_config, verbosity);
    }

    samples.par_sort_unstable_by_key(|sample| sample.id);

    SampleSet::new(samples, labels)
}

fn interp_quantity<F, S, const N: usize>(
    interpolator: &LinearInterpolator<F, S, N>,
    point: &Point3<F>,
    cell: usize,
    quantity: SampledQuantity,
) -> Solution<F>
where
    F: BFloat,
    S: CellShape<N>,
{
    match quantity {
        SampledQuantity::Solution => interpolator.interp_solution(point, cell),
        SampledQuantity::Vector => Solution::from_vector(interpolator.interp_vector(point, cell)),
        SampledQuantity::Scalar => Solution::from_scalar(interpolator.interp_scalar(point, cell)),
    }
}

#[cfg(test)]
pub(crate) mod test_points {
    use super::*;

    /// Deterministic, evenly scattered points in the unit cube.
    pub fn scattered_points(n_points: usize) -> Vec<Point3<f64>> {
        const STEPS: [f64; 3] = [0.618_033_988_7, 0.754_877_666_2, 0.569_840_290_9];
        (1..=n_points)
            .map(|k| {
                let k = k as f64;
                Point3::new(
                    (k * STEPS[0]).fract(),
                    (k * STEPS[1]).fract(),
                    (k * STEPS[2]).fract(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{test_points::*, *};
    use crate::{
        interpolation::{test_interpolators::*, InterpolatorConfig, Tetrahedron, Triangle},
        mesh::test_meshes,
    };
    use approx::assert_abs_diff_eq;

    #[test]
    fn sorting_does_not_change_results() {
        let interpolator = interpolator_with_linear_solution(
            test_meshes::box_tetrahedral_mesh(4),
            InterpolatorConfig::default(),
        );
        let points = scattered_points(700);

        let sorted = sample_points(
            &interpolator,
            &points,
            &SamplingConfig {
                chunk_size: 50,
                ..SamplingConfig::default()
            },
            QuantityLabels::electric(),
            &Verbosity::Quiet,
        );
        let unsorted = sample_points(
            &interpolator,
            &points,
            &SamplingConfig {
                spatial_sorting: false,
                chunk_size: 1000,
                ..SamplingConfig::default()
            },
            QuantityLabels::electric(),
            &Verbosity::Quiet,
        );

        assert_eq!(sorted.len(), points.len());
        for ((point, a), b) in points
            .iter()
            .zip(sorted.samples())
            .zip(unsorted.samples())
        {
            assert_eq!(a.position, *point);
            assert_eq!(a.id, b.id);
            assert!(a.located && b.located);
            assert_abs_diff_eq!(a.solution.vector, b.solution.vector, epsilon = 1e-9);
            assert_abs_diff_eq!(a.solution.scalar, b.solution.scalar, epsilon = 1e-9);
            assert_abs_diff_eq!(
                a.solution.scalar,
                linear_solution(point).scalar,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn visiting_order_does_not_change_nonlinear_results() {
        use crate::geometry::{Dim3::*, Vec3};
        use std::sync::Arc;

        let mesh = test_meshes::box_tetrahedral_mesh(4);
        let solutions = mesh
            .nodes()
            .iter()
            .map(|node| {
                let scalar = (7.0 * node[X]).sin() * (5.0 * node[Y]).cos()
                    + 10.0 * node[Z] * node[Z];
                Solution::new(Vec3::new(scalar, -scalar, node[X] * node[Y]), scalar)
            })
            .collect();
        let interpolator = LinearInterpolator::<f64, Tetrahedron, 4>::new(
            Arc::new(mesh),
            solutions,
            InterpolatorConfig::default(),
            &Verbosity::Quiet,
        );

        // Include points slightly outside the box, inside the tolerance band
        let points: Vec<_> = scattered_points(2000)
            .into_iter()
            .map(|point| {
                Point3::new(
                    1.02 * point[X] - 0.01,
                    1.02 * point[Y] - 0.01,
                    1.02 * point[Z] - 0.01,
                )
            })
            .collect();

        let sorted = sample_points(
            &interpolator,
            &points,
            &SamplingConfig {
                chunk_size: 50,
                ..SamplingConfig::default()
            },
            QuantityLabels::generic(),
            &Verbosity::Quiet,
        );
        let unsorted = sample_points(
            &interpolator,
            &points,
            &SamplingConfig {
                spatial_sorting: false,
                chunk_size: 7,
                ..SamplingConfig::default()
            },
            QuantityLabels::generic(),
            &Verbosity::Quiet,
        );

        for (a, b) in sorted.samples().iter().zip(unsorted.samples()) {
            assert_eq!(a.id, b.id);
            assert!(a.located && b.located);
            assert_eq!(a.cell, b.cell);
            assert_abs_diff_eq!(a.solution.scalar, b.solution.scalar, epsilon = 1e-12);
            assert_abs_diff_eq!(a.solution.vector, b.solution.vector, epsilon = 1e-12);
        }
    }

    #[test]
    fn triangle_batch_rejects_points_off_the_surface() {
        use std::sync::Arc;

        let mesh = test_meshes::unit_square_triangles();
        let solutions = mesh.nodes().iter().map(linear_solution).collect();
        let interpolator = LinearInterpolator::<f64, Triangle, 3>::new(
            Arc::new(mesh),
            solutions,
            InterpolatorConfig::default(),
            &Verbosity::Quiet,
        );
        let points = [
            Point3::new(0.25, 0.5, 0.0),
            Point3::new(0.3, 0.2, 1000.0),
            Point3::new(0.75, 0.25, 0.02),
        ];
        let samples = sample_points(
            &interpolator,
            &points,
            &SamplingConfig::default(),
            QuantityLabels::generic(),
            &Verbosity::Quiet,
        );
        assert_eq!(samples.n_unlocated(), 1);
        assert!(!samples.samples()[1].located);
        assert_eq!(samples.samples()[1].solution, Solution::filled(1e20));
        assert_abs_diff_eq!(samples.samples()[0].solution.scalar, 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(samples.samples()[2].solution.scalar, 1.25, epsilon = 1e-12);
    }

    #[test]
    fn far_away_points_get_sentinel() {
        let interpolator = interpolator_with_linear_solution(
            test_meshes::unit_tetrahedron(),
            InterpolatorConfig::default(),
        );
        let points = [Point3::new(0.2, 0.2, 0.2), Point3::new(3.0, 0.1, 0.1)];
        let samples = sample_points(
            &interpolator,
            &points,
            &SamplingConfig::default(),
            QuantityLabels::electric(),
            &Verbosity::Quiet,
        );
        assert_eq!(samples.n_unlocated(), 1);
        assert!(samples.samples()[0].located);
        assert!(!samples.samples()[1].located);
        assert_eq!(samples.samples()[1].solution, Solution::filled(1e20));
    }

    #[test]
    fn extrapolation_policy_extends_linear_field() {
        let interpolator = interpolator_with_linear_solution(
            test_meshes::unit_tetrahedron(),
            InterpolatorConfig {
                unlocated_policy: UnlocatedPolicy::Extrapolate,
                ..InterpolatorConfig::default()
            },
        );
        let point = Point3::new(3.0, 0.1, 0.1);
        let samples = sample_points(
            &interpolator,
            &[point],
            &SamplingConfig::default(),
            QuantityLabels::electric(),
            &Verbosity::Quiet,
        );
        let sample = &samples.samples()[0];
        assert!(!sample.located);
        assert_abs_diff_eq!(
            sample.solution.scalar,
            linear_solution(&point).scalar,
            epsilon = 1e-10
        );
    }

    #[test]
    fn strict_search_rejects_points_just_outside() {
        let interpolator = interpolator_with_linear_solution(
            test_meshes::unit_tetrahedron(),
            InterpolatorConfig::default(),
        );
        let points = [Point3::new(-0.05, 0.2, 0.2)];
        let tolerant = sample_points(
            &interpolator,
            &points,
            &SamplingConfig::default(),
            QuantityLabels::generic(),
            &Verbosity::Quiet,
        );
        let strict = sample_points(
            &interpolator,
            &points,
            &SamplingConfig {
                search_outside: false,
                ..SamplingConfig::default()
            },
            QuantityLabels::generic(),
            &Verbosity::Quiet,
        );
        assert_eq!(tolerant.n_unlocated(), 0);
        assert_eq!(strict.n_unlocated(), 1);
    }

    #[test]
    fn vector_mode_leaves_scalar_zero() {
        let interpolator = interpolator_with_linear_solution(
            test_meshes::box_tetrahedral_mesh(2),
            InterpolatorConfig::default(),
        );
        let point = Point3::new(0.4, 0.3, 0.2);
        let samples = sample_points(
            &interpolator,
            &[point],
            &SamplingConfig {
                quantity: SampledQuantity::Vector,
                ..SamplingConfig::default()
            },
            QuantityLabels::electric(),
            &Verbosity::Quiet,
        );
        let solution = samples.samples()[0].solution;
        assert_eq!(solution.scalar, 0.0);
        assert_abs_diff_eq!(
            solution.vector,
            linear_solution(&point).vector,
            epsilon = 1e-10
        );
    }

    #[test]
    fn solutions_by_id_fill_missing_with_zero() {
        let samples = SampleSet::new(
            vec![Sample {
                id: 2,
                position: Point3::origin(),
                cell: 0,
                located: true,
                solution: Solution::from_scalar(5.0),
            }],
            QuantityLabels::generic(),
        );
        let solutions = samples.solutions_by_id(4);
        assert_eq!(solutions[2].scalar, 5.0);
        assert_eq!(solutions[0], Solution::zero());
        assert_eq!(solutions[3], Solution::zero());
    }

    #[test]
    fn empty_batch_gives_empty_set() {
        let interpolator = unit_tetrahedron_interpolator();
        let samples = sample_points(
            &interpolator,
            &[],
            &SamplingConfig::default(),
            QuantityLabels::generic(),
            &Verbosity::Quiet,
        );
        assert!(samples.is_empty());
    }
}
