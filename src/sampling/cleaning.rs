//! Detection and replacement of outliers in sampled solutions.
//!
//! Outliers are values separated from the bulk of a channel's distribution by
//! an empty histogram bin. They are replaced by a distance-weighted average of
//! the valid samples around them.

use super::Sample;
use crate::{
    geometry::Vec3,
    interpolation::{InterpolatorConfig, Solution, SolutionChannel},
    io::Verbosity,
    num::{from_f64, from_usize, BFloat},
};
use rayon::prelude::*;

/// Histogram of the values of one solution channel.
#[derive(Clone, Debug)]
pub struct Histogram<F> {
    bounds: Vec<F>,
    counts: Vec<usize>,
}

impl<F: BFloat> Histogram<F> {
    /// Builds a histogram with `n_bins` equally wide bins spanning the values
    /// whose magnitude is below the sentinel magnitude.
    ///
    /// Returns `None` if there are no such values or they are all equal.
    pub fn new(values: &[F], n_bins: usize, sentinel_magnitude: F) -> Option<Self> {
        assert!(n_bins > 0, "Number of histogram bins must be larger than zero");

        let (min_value, max_value) = values
            .iter()
            .filter(|value| value.abs() < sentinel_magnitude)
            .fold(None, |range: Option<(F, F)>, &value| match range {
                Some((min_value, max_value)) => {
                    Some((min_value.min(value), max_value.max(value)))
                }
                None => Some((value, value)),
            })?;

        if !(max_value > min_value) {
            return None;
        }

        let step = (max_value - min_value) / from_usize(n_bins);
        let mut bounds: Vec<F> = (0..=n_bins)
            .map(|bin| min_value + step * from_usize(bin))
            .collect();
        // Make sure the maximum value falls inside the last bin
        bounds[n_bins] = bounds[n_bins] + step * from_f64(1e-5);

        let mut counts = vec![0; n_bins];
        for &value in values
            .iter()
            .filter(|value| value.abs() < sentinel_magnitude)
        {
            let bin = ((value - min_value) / step)
                .floor()
                .to_usize()
                .unwrap_or(0)
                .min(n_bins - 1);
            counts[bin] += 1;
        }

        Some(Self { bounds, counts })
    }

    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Returns the `n_bins + 1` bin edges.
    pub fn bounds(&self) -> &[F] {
        &self.bounds
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Finds the range of values to accept.
    ///
    /// The upper limit is the lower edge of the first empty bin found when
    /// scanning down from the top, among the bins with non-negative lower
    /// edge. The lower limit is the upper edge of the first empty bin found
    /// when scanning up from the bottom, among the bins with negative upper
    /// edge.
    ///
    /// Returns `None` if no empty bin was found in either scan.
    pub fn acceptance_bounds(&self) -> Option<(F, F)> {
        let n_bins = self.n_bins();
        let lowest = self.bounds[0];
        let highest = self.bounds[n_bins];

        let mut upper = highest;
        for bin in (0..n_bins).rev() {
            if self.bounds[bin] < F::zero() {
                break;
            }
            if self.counts[bin] == 0 {
                upper = self.bounds[bin];
                break;
            }
        }

        let mut lower = lowest;
        for bin in 0..n_bins {
            if self.bounds[bin + 1] >= F::zero() {
                break;
            }
            if self.counts[bin] == 0 {
                lower = self.bounds[bin + 1];
                break;
            }
        }

        if upper == highest && lower == lowest {
            None
        } else {
            Some((lower, upper))
        }
    }
}

/// Summary of a cleaning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleaningReport {
    /// Number of samples flagged as outliers.
    pub n_outliers: usize,
    /// Number of outliers left unchanged because they had no valid neighbours.
    pub n_unaveraged: usize,
}

impl CleaningReport {
    fn combined(self, other: Self) -> Self {
        Self {
            n_outliers: self.n_outliers + other.n_outliers,
            n_unaveraged: self.n_unaveraged + other.n_unaveraged,
        }
    }
}

/// Cleans every solution channel in turn: the three vector components, the
/// norm and the scalar.
pub fn clean_all_channels<F: BFloat>(
    samples: &mut [Sample<F>],
    config: &InterpolatorConfig,
    verbosity: &Verbosity,
) -> CleaningReport {
    SolutionChannel::all()
        .iter()
        .fold(CleaningReport::default(), |report, &channel| {
            report.combined(clean_channel(samples, channel, config, verbosity))
        })
}

/// Replaces outliers in the given channel of the samples.
///
/// The histogram has one bin per `histogram_bin_divisor` samples. Nothing is
/// done if there would be fewer than two bins, if the cleaning cutoff radius
/// is too small, or if the histogram has no gap. An outlier is replaced by
/// the average of the samples within the cutoff radius that are neither
/// outliers nor sentinels, weighted by `exp(-distance/(cutoff/5))`. All
/// channels of the outlier's solution are replaced.
pub fn clean_channel<F: BFloat>(
    samples: &mut [Sample<F>],
    channel: SolutionChannel,
    config: &InterpolatorConfig,
    verbosity: &Verbosity,
) -> CleaningReport {
    if !config.cleaning_enabled() {
        return CleaningReport::default();
    }

    let n_bins = samples.len() / config.histogram_bin_divisor;
    if n_bins < 2 {
        if verbosity.print_messages() {
            eprintln!(
                "Warning: Too few samples ({}) to detect outliers in {}",
                samples.len(),
                channel
            );
        }
        return CleaningReport::default();
    }

    let sentinel_magnitude: F = from_f64(config.error_sentinel_magnitude);
    let values: Vec<F> = samples
        .iter()
        .map(|sample| sample.solution.channel(channel))
        .collect();

    let (lower, upper) = match Histogram::new(&values, n_bins, sentinel_magnitude)
        .and_then(|histogram| histogram.acceptance_bounds())
    {
        Some(bounds) => bounds,
        None => return CleaningReport::default(),
    };

    let is_outlier: Vec<bool> = values
        .iter()
        .map(|&value| value.abs() < sentinel_magnitude && (value < lower || value > upper))
        .collect();
    let n_outliers = is_outlier.iter().filter(|&&outlier| outlier).count();
    if n_outliers == 0 {
        return CleaningReport::default();
    }

    let cutoff: F = from_f64(config.cleaning_cutoff_radius);
    let replacements: Vec<(usize, Option<Solution<F>>)> = {
        let samples: &[Sample<F>] = samples;
        is_outlier
            .par_iter()
            .enumerate()
            .filter(|&(_, &outlier)| outlier)
            .map(|(idx, _)| {
                (
                    idx,
                    weighted_neighbor_average(samples, idx, &is_outlier, cutoff, sentinel_magnitude),
                )
            })
            .collect()
    };

    let mut n_unaveraged = 0;
    for (idx, replacement) in replacements {
        match replacement {
            Some(solution) => samples[idx].solution = solution,
            None => n_unaveraged += 1,
        }
    }

    if verbosity.print_messages() {
        println!(
            "Replaced {} of {} outliers in {} (accepted range [{}, {}])",
            n_outliers - n_unaveraged,
            n_outliers,
            channel,
            lower,
            upper
        );
        if n_unaveraged > 0 {
            eprintln!(
                "Warning: {} outliers in {} can't be averaged, no valid samples within {}",
                n_unaveraged, channel, cutoff
            );
        }
    }

    CleaningReport {
        n_outliers,
        n_unaveraged,
    }
}

fn weighted_neighbor_average<F: BFloat>(
    samples: &[Sample<F>],
    center_idx: usize,
    is_outlier: &[bool],
    cutoff: F,
    sentinel_magnitude: F,
) -> Option<Solution<F>> {
    let center = &samples[center_idx].position;
    let decay_length = cutoff / from_f64(5.0);

    let mut vector_sum = Vec3::zero();
    let mut scalar_sum = F::zero();
    let mut weight_sum = F::zero();

    for (idx, sample) in samples.iter().enumerate() {
        if idx == center_idx || is_outlier[idx] || sample.solution.is_sentinel(sentinel_magnitude)
        {
            continue;
        }
        let distance = center.distance_to(&sample.position);
        if distance > cutoff {
            continue;
        }
        let weight = (-distance / decay_length).exp();
        vector_sum = vector_sum + sample.solution.vector * weight;
        scalar_sum = scalar_sum + sample.solution.scalar * weight;
        weight_sum = weight_sum + weight;
    }

    if weight_sum > F::zero() {
        Some(Solution::new(vector_sum / weight_sum, scalar_sum / weight_sum))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geometry::Point3, sampling::Sample};

    const OUTLIER_IDS: [usize; 5] = [111, 333, 555, 777, 888];

    /// 1000 samples on a 10x10x10 lattice with unit spacing, with scalars
    /// spread evenly over [0, 1] except for five samples at 1e6.
    fn lattice_samples_with_outliers() -> Vec<Sample<f64>> {
        let mut regular_idx = 0;
        (0..1000)
            .map(|id| {
                let position = Point3::new(
                    (id % 10) as f64,
                    ((id / 10) % 10) as f64,
                    (id / 100) as f64,
                );
                let scalar = if OUTLIER_IDS.contains(&id) {
                    1e6
                } else {
                    regular_idx += 1;
                    (regular_idx - 1) as f64 / 994.0
                };
                Sample {
                    id,
                    position,
                    cell: 0,
                    located: true,
                    solution: Solution::from_scalar(scalar),
                }
            })
            .collect()
    }

    fn cleaning_config() -> InterpolatorConfig {
        InterpolatorConfig {
            cleaning_cutoff_radius: 1.5,
            ..InterpolatorConfig::default()
        }
    }

    #[test]
    fn isolated_outliers_are_replaced() {
        let mut samples = lattice_samples_with_outliers();
        let report = clean_all_channels(&mut samples, &cleaning_config(), &Verbosity::Quiet);
        assert_eq!(
            report,
            CleaningReport {
                n_outliers: 5,
                n_unaveraged: 0
            }
        );
        for &id in &OUTLIER_IDS {
            let scalar = samples[id].solution.scalar;
            assert!((0.0..=1.0).contains(&scalar), "scalar {} not replaced", scalar);
        }
    }

    #[test]
    fn cleaning_twice_changes_nothing() {
        let mut samples = lattice_samples_with_outliers();
        clean_all_channels(&mut samples, &cleaning_config(), &Verbosity::Quiet);
        let cleaned = samples.clone();
        let report = clean_all_channels(&mut samples, &cleaning_config(), &Verbosity::Quiet);
        assert_eq!(report, CleaningReport::default());
        assert_eq!(samples, cleaned);
    }

    #[test]
    fn small_batches_are_skipped() {
        let mut samples: Vec<_> = lattice_samples_with_outliers().into_iter().take(400).collect();
        samples[5].solution = Solution::from_scalar(1e6);
        let original = samples.clone();
        let report = clean_channel(
            &mut samples,
            SolutionChannel::Scalar,
            &cleaning_config(),
            &Verbosity::Quiet,
        );
        assert_eq!(report, CleaningReport::default());
        assert_eq!(samples, original);
    }

    #[test]
    fn too_small_cutoff_disables_cleaning() {
        let mut samples = lattice_samples_with_outliers();
        let config = InterpolatorConfig {
            cleaning_cutoff_radius: 0.05,
            ..InterpolatorConfig::default()
        };
        let report = clean_all_channels(&mut samples, &config, &Verbosity::Quiet);
        assert_eq!(report, CleaningReport::default());
    }

    #[test]
    fn outliers_without_neighbors_are_kept() {
        let mut samples = lattice_samples_with_outliers();
        let config = InterpolatorConfig {
            cleaning_cutoff_radius: 0.5,
            ..InterpolatorConfig::default()
        };
        let report = clean_channel(&mut samples, SolutionChannel::Scalar, &config, &Verbosity::Quiet);
        assert_eq!(report.n_outliers, 5);
        assert_eq!(report.n_unaveraged, 5);
        assert_eq!(samples[OUTLIER_IDS[0]].solution.scalar, 1e6);
    }

    #[test]
    fn sentinels_are_ignored_by_histogram() {
        let values = [0.0, 0.25, 0.5, 1.0, 1e20, -1e20];
        let histogram = Histogram::new(&values, 4, 1e20).unwrap();
        assert_eq!(histogram.counts().iter().sum::<usize>(), 4);
        assert_eq!(histogram.bounds()[0], 0.0);
        assert!(histogram.bounds()[4] > 1.0);
    }

    #[test]
    fn negative_outliers_set_lower_bound() {
        let mut values = vec![-100.0];
        values.extend((0..99).map(|idx| -1.0 + idx as f64 / 98.0));
        let histogram = Histogram::new(&values, 10, 1e20).unwrap();
        let (lower, upper) = histogram.acceptance_bounds().unwrap();
        assert_eq!(upper, histogram.bounds()[10]);
        assert!(lower > -100.0 && lower <= -1.0);
    }

    #[test]
    fn constant_values_give_no_histogram() {
        assert!(Histogram::new(&[2.0; 10], 3, 1e20).is_none());
    }
}
