//! Summary statistics of sampled solutions.

use super::SampleSet;
use crate::{
    geometry::{Dim3, Vec3},
    num::{from_f64, from_usize, BFloat},
};
use std::fmt;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Statistics over the located samples of a sample set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct SolutionStatistics<F> {
    pub n_samples: usize,
    pub mean_vector: Vec3<F>,
    /// Root mean square of each vector component.
    pub rms_vector: Vec3<F>,
    pub mean_scalar: F,
    pub rms_scalar: F,
    pub min_norm: F,
    pub max_norm: F,
    pub min_scalar: F,
    pub max_scalar: F,
}

impl<F: BFloat> SampleSet<F> {
    /// Computes statistics over the samples whose point was inside a cell,
    /// or returns `None` if there are no such samples.
    pub fn statistics(&self) -> Option<SolutionStatistics<F>> {
        let solutions: Vec<_> = self
            .samples()
            .iter()
            .filter(|sample| sample.located)
            .map(|sample| &sample.solution)
            .collect();
        if solutions.is_empty() {
            return None;
        }
        let count: F = from_usize(solutions.len());

        let mean_vector = solutions.iter().map(|solution| solution.vector).sum::<Vec3<F>>() / count;
        let rms_vector = Vec3::with_each_component(|dim| {
            (solutions
                .iter()
                .map(|solution| solution.vector[dim].powi(2))
                .sum::<F>()
                / count)
                .sqrt()
        });
        let mean_scalar = solutions.iter().map(|solution| solution.scalar).sum::<F>() / count;
        let rms_scalar = (solutions
            .iter()
            .map(|solution| solution.scalar.powi(2))
            .sum::<F>()
            / count)
            .sqrt();

        let (min_norm, max_norm) = value_range(solutions.iter().map(|solution| solution.norm));
        let (min_scalar, max_scalar) =
            value_range(solutions.iter().map(|solution| solution.scalar));

        Some(SolutionStatistics {
            n_samples: solutions.len(),
            mean_vector,
            rms_vector,
            mean_scalar,
            rms_scalar,
            min_norm,
            max_norm,
            min_scalar,
            max_scalar,
        })
    }

    /// Computes the ratio of the largest sampled vector norm to the given
    /// reference norm, typically the magnitude of the applied field.
    pub fn field_enhancement(&self, reference_norm: F) -> Option<F> {
        self.statistics()
            .map(|statistics| statistics.max_norm / reference_norm.abs())
    }
}

fn value_range<F: BFloat, I: Iterator<Item = F>>(values: I) -> (F, F) {
    values.fold((F::infinity(), F::neg_infinity()), |(min, max), value| {
        (min.min(value), max.max(value))
    })
}

/// Computes the analytical field enhancement at the apex of a conducting
/// hemi-ellipsoid on a flat plane in a uniform field.
///
/// A hemisphere (or an oblate shape) gives the value 3.
pub fn hemiellipsoid_enhancement<F: BFloat>(base_radius: F, height: F) -> F {
    let three: F = from_f64(3.0);
    if height <= base_radius {
        return three;
    }
    let aspect_ratio = height / base_radius;
    let zeta = (aspect_ratio * aspect_ratio - F::one()).sqrt();
    zeta.powi(3) / (aspect_ratio * (zeta + aspect_ratio).ln() - zeta)
}

impl<F: BFloat> fmt::Display for SolutionStatistics<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "samples: {}", self.n_samples)?;
        for dim in Dim3::slice() {
            writeln!(
                f,
                "vector {}: mean = {}, rms = {}",
                dim, self.mean_vector[dim], self.rms_vector[dim]
            )?;
        }
        writeln!(f, "norm: min = {}, max = {}", self.min_norm, self.max_norm)?;
        write!(
            f,
            "scalar: mean = {}, rms = {}, min = {}, max = {}",
            self.mean_scalar, self.rms_scalar, self.min_scalar, self.max_scalar
        )
    }
}
