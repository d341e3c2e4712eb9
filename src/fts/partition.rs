//! Universe of Discourse partitioning for the fuzzy time series model.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Span substituted when every training observation is identical, so the
/// universe still partitions into non-degenerate intervals.
const MIN_UOD_SPAN: f64 = 1.0;

/// Policy for dividing the universe into intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionMethod {
    /// Equal-length intervals over the padded range.
    #[default]
    EqualWidth,
    /// Breakpoints at empirical quantiles so each interval holds roughly the
    /// same number of training observations.
    EqualFrequency,
}

/// One sub-interval of the universe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    /// Representative value used in defuzzification.
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// An ordered, contiguous partition of the Universe of Discourse.
///
/// Intervals are sorted ascending, share their boundaries, and their union is
/// exactly the padded `[min - pad, max + pad]` range of the training series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    intervals: Vec<Interval>,
    uod: (f64, f64),
}

impl Partition {
    /// Build a partition from training observations.
    ///
    /// Requires `n_intervals >= 2`, `pad_fraction >= 0`, and a non-empty,
    /// finite series. An all-identical series falls back to equal-width
    /// division of a minimum-width universe regardless of `method`.
    pub fn build(
        values: &[f64],
        method: PartitionMethod,
        n_intervals: usize,
        pad_fraction: f64,
    ) -> Result<Self> {
        if n_intervals < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "n_intervals must be at least 2, got {n_intervals}"
            )));
        }
        if !(pad_fraction >= 0.0) || !pad_fraction.is_finite() {
            return Err(AnalysisError::InvalidParameter(format!(
                "pad_fraction must be a non-negative number, got {pad_fraction}"
            )));
        }
        if values.is_empty() {
            return Err(AnalysisError::EmptyData);
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            if !v.is_finite() {
                return Err(AnalysisError::InvalidParameter(
                    "series contains non-finite values".to_string(),
                ));
            }
            min = min.min(*v);
            max = max.max(*v);
        }

        let span = max - min;
        if span == 0.0 {
            // Degenerate series: widen around the single value and split
            // equal-width; quantiles carry no information here.
            let pad = MIN_UOD_SPAN * pad_fraction;
            let uod = (min - MIN_UOD_SPAN / 2.0 - pad, max + MIN_UOD_SPAN / 2.0 + pad);
            return Ok(Self {
                intervals: equal_width(uod, n_intervals),
                uod,
            });
        }

        let pad = span * pad_fraction;
        let uod = (min - pad, max + pad);
        let intervals = match method {
            PartitionMethod::EqualWidth => equal_width(uod, n_intervals),
            PartitionMethod::EqualFrequency => equal_frequency(values, uod, n_intervals)?,
        };
        Ok(Self { intervals, uod })
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// A partition always holds at least two intervals.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The padded `(min, max)` bounds of the universe.
    pub fn uod(&self) -> (f64, f64) {
        self.uod
    }

    /// The ordered intervals.
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Midpoint of the interval at `label`.
    pub fn midpoint(&self, label: usize) -> f64 {
        self.intervals[label].midpoint()
    }

    /// All interval midpoints in order.
    pub fn midpoints(&self) -> Vec<f64> {
        self.intervals.iter().map(Interval::midpoint).collect()
    }

    /// Map a value to the index of its containing interval.
    ///
    /// Interior boundaries are left-inclusive/right-exclusive; the last
    /// interval is closed on both ends. Values outside the universe clamp to
    /// the nearest boundary interval — forecasting targets may exceed the
    /// training-derived range.
    pub fn label_of(&self, value: f64) -> usize {
        let n = self.intervals.len();
        if value < self.intervals[0].lower {
            return 0;
        }
        if value > self.intervals[n - 1].upper {
            return n - 1;
        }
        for (i, interval) in self.intervals.iter().enumerate() {
            if i == n - 1 {
                if interval.lower <= value && value <= interval.upper {
                    return i;
                }
            } else if interval.lower <= value && value < interval.upper {
                return i;
            }
        }
        n - 1
    }

    /// Clamp a value into the universe bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.uod.0).min(self.uod.1)
    }
}

/// Cumulative equal-length split; the final upper bound is pinned to the
/// universe max so rounding never leaves a gap.
fn equal_width(uod: (f64, f64), n: usize) -> Vec<Interval> {
    let length = (uod.1 - uod.0) / n as f64;
    let mut intervals = Vec::with_capacity(n);
    let mut lower = uod.0;
    for i in 0..n {
        let upper = if i == n - 1 { uod.1 } else { lower + length };
        intervals.push(Interval { lower, upper });
        lower = upper;
    }
    intervals
}

/// Quantile breakpoints over the unpadded observations; the first and last
/// interval extend to the padded universe bounds.
fn equal_frequency(values: &[f64], uod: (f64, f64), n: usize) -> Result<Vec<Interval>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let per_bin = sorted.len() / n;
    if per_bin == 0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "equal-frequency partitioning needs at least {n} observations, got {}",
            sorted.len()
        )));
    }

    let mut bounds = Vec::with_capacity(n + 1);
    bounds.push(uod.0);
    for i in 1..n {
        bounds.push(sorted[i * per_bin]);
    }
    bounds.push(uod.1);

    for pair in bounds.windows(2) {
        if pair[1] <= pair[0] {
            return Err(AnalysisError::InvalidParameter(format!(
                "too few distinct values for {n} equal-frequency intervals"
            )));
        }
    }

    Ok(bounds
        .windows(2)
        .map(|pair| Interval {
            lower: pair[0],
            upper: pair[1],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn equal_width_covers_padded_range_exactly() {
        let values = vec![10.0, 20.0, 30.0, 40.0];
        let partition = Partition::build(&values, PartitionMethod::EqualWidth, 5, 0.1).unwrap();

        assert_eq!(partition.len(), 5);
        let (lo, hi) = partition.uod();
        assert_relative_eq!(lo, 7.0, epsilon = 1e-12);
        assert_relative_eq!(hi, 43.0, epsilon = 1e-12);
        assert_relative_eq!(partition.intervals()[0].lower, lo, epsilon = 1e-12);
        assert_relative_eq!(partition.intervals()[4].upper, hi, epsilon = 1e-12);
        for pair in partition.intervals().windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
        }
    }

    #[test]
    fn equal_frequency_balances_observations() {
        // 9 observations, 3 intervals: breakpoints at sorted[3] and sorted[6].
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let partition =
            Partition::build(&values, PartitionMethod::EqualFrequency, 3, 0.0).unwrap();

        assert_eq!(partition.len(), 3);
        assert_relative_eq!(partition.intervals()[0].upper, 4.0, epsilon = 1e-12);
        assert_relative_eq!(partition.intervals()[1].upper, 7.0, epsilon = 1e-12);
        assert_relative_eq!(partition.intervals()[2].upper, 9.0, epsilon = 1e-12);
        for pair in partition.intervals().windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
        }
    }

    #[test]
    fn equal_frequency_rejects_collapsed_breakpoints() {
        // Only two distinct values cannot support four intervals.
        let values = vec![5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 7.0, 7.0];
        let result = Partition::build(&values, PartitionMethod::EqualFrequency, 4, 0.05);
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn equal_frequency_rejects_more_intervals_than_observations() {
        let values = vec![1.0, 2.0, 3.0];
        let result = Partition::build(&values, PartitionMethod::EqualFrequency, 5, 0.05);
        assert!(matches!(result, Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn degenerate_series_falls_back_to_minimum_width_universe() {
        let values = vec![42.0; 10];
        for method in [PartitionMethod::EqualWidth, PartitionMethod::EqualFrequency] {
            let partition = Partition::build(&values, method, 4, 0.05).unwrap();
            assert_eq!(partition.len(), 4);
            let (lo, hi) = partition.uod();
            assert!(lo < 42.0 && hi > 42.0);
            for interval in partition.intervals() {
                assert!(interval.upper > interval.lower);
            }
        }
    }

    #[test]
    fn build_validates_parameters() {
        let values = vec![1.0, 2.0];
        assert!(matches!(
            Partition::build(&values, PartitionMethod::EqualWidth, 1, 0.05),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            Partition::build(&values, PartitionMethod::EqualWidth, 3, -0.1),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            Partition::build(&[], PartitionMethod::EqualWidth, 3, 0.05),
            Err(AnalysisError::EmptyData)
        ));
        assert!(matches!(
            Partition::build(&[1.0, f64::NAN], PartitionMethod::EqualWidth, 3, 0.05),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn label_boundaries_are_right_exclusive_except_last() {
        let values = vec![0.0, 10.0];
        let partition = Partition::build(&values, PartitionMethod::EqualWidth, 5, 0.0).unwrap();

        // Interior boundary belongs to the interval on its right.
        let boundary = partition.intervals()[1].lower;
        assert_eq!(partition.label_of(boundary), 1);

        // The universe's right edge belongs to the last interval.
        assert_eq!(partition.label_of(10.0), 4);
        // The left edge belongs to the first.
        assert_eq!(partition.label_of(0.0), 0);
    }

    #[test]
    fn out_of_universe_values_clamp_to_boundary_intervals() {
        let values = vec![0.0, 10.0];
        let partition = Partition::build(&values, PartitionMethod::EqualWidth, 4, 0.05).unwrap();

        assert_eq!(partition.label_of(-100.0), 0);
        assert_eq!(partition.label_of(100.0), 3);
        assert_relative_eq!(partition.clamp(-100.0), partition.uod().0);
        assert_relative_eq!(partition.clamp(100.0), partition.uod().1);
    }

    #[test]
    fn midpoints_sit_inside_their_intervals() {
        let values = vec![5.0, 25.0, 45.0];
        let partition = Partition::build(&values, PartitionMethod::EqualWidth, 4, 0.1).unwrap();

        for (i, interval) in partition.intervals().iter().enumerate() {
            let mid = partition.midpoint(i);
            assert!(interval.lower < mid && mid < interval.upper);
        }
        assert_eq!(partition.midpoints().len(), 4);
    }
}
