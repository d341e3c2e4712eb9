//! Resampling and train/test splitting ahead of the forecasting stages.
//!
//! Observations are bucketed onto a fixed-interval grid, gaps are imputed
//! (forward fill, then back fill, then zero), and the cleaned series is split
//! sequentially — no shuffling, the test window always follows the training
//! window in time.

use crate::core::Series;
use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation applied to the observations that fall into one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    /// Mean of the observations in the bucket.
    #[default]
    Mean,
    /// Last observation in the bucket.
    ForwardFill,
    /// Mean per bucket, then linear interpolation across empty buckets.
    Linear,
}

/// Counts describing one resampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResampleReport {
    /// Observations in the input series.
    pub original_count: usize,
    /// Buckets in the output grid.
    pub resampled_count: usize,
    /// Buckets that were empty before imputation.
    pub missing_filled: usize,
}

/// Resample a series onto a fixed-interval grid.
///
/// The grid spans from the bucket containing the first observation to the
/// bucket containing the last one. Empty buckets are imputed with forward
/// fill, back fill, then zero, and counted in the report.
pub fn resample(
    series: &Series,
    bucket: Duration,
    method: ResampleMethod,
) -> Result<(Series, ResampleReport)> {
    if series.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    let step = bucket.num_seconds();
    if step <= 0 {
        return Err(AnalysisError::InvalidParameter(
            "resample interval must be positive".to_string(),
        ));
    }

    let timestamps = series.timestamps();
    let values = series.values();
    let first_bucket = timestamps[0].timestamp().div_euclid(step) * step;
    let last_bucket = timestamps[timestamps.len() - 1].timestamp().div_euclid(step) * step;
    let n_buckets = ((last_bucket - first_bucket) / step) as usize + 1;

    let mut grid = vec![f64::NAN; n_buckets];
    match method {
        ResampleMethod::Mean | ResampleMethod::Linear => {
            let mut sums = vec![0.0; n_buckets];
            let mut counts = vec![0usize; n_buckets];
            for (ts, v) in timestamps.iter().zip(values.iter()) {
                let idx = ((ts.timestamp().div_euclid(step) * step - first_bucket) / step) as usize;
                sums[idx] += v;
                counts[idx] += 1;
            }
            for i in 0..n_buckets {
                if counts[i] > 0 {
                    grid[i] = sums[i] / counts[i] as f64;
                }
            }
        }
        ResampleMethod::ForwardFill => {
            // Timestamps are sorted, so the last write per bucket wins.
            for (ts, v) in timestamps.iter().zip(values.iter()) {
                let idx = ((ts.timestamp().div_euclid(step) * step - first_bucket) / step) as usize;
                grid[idx] = *v;
            }
        }
    }

    if method == ResampleMethod::Linear {
        interpolate_gaps(&mut grid);
    }

    let missing_filled = grid.iter().filter(|v| v.is_nan()).count();

    // Forward fill, then back fill, then zero.
    let mut last_valid = None;
    for v in grid.iter_mut() {
        if v.is_nan() {
            if let Some(fill) = last_valid {
                *v = fill;
            }
        } else {
            last_valid = Some(*v);
        }
    }
    let mut next_valid = None;
    for v in grid.iter_mut().rev() {
        if v.is_nan() {
            *v = next_valid.unwrap_or(0.0);
        } else {
            next_valid = Some(*v);
        }
    }

    let grid_timestamps: Vec<DateTime<Utc>> = (0..n_buckets)
        .map(|i| {
            DateTime::<Utc>::from_timestamp(first_bucket + i as i64 * step, 0).ok_or_else(|| {
                AnalysisError::TimestampError("bucket timestamp out of range".to_string())
            })
        })
        .collect::<Result<_>>()?;

    let report = ResampleReport {
        original_count: series.len(),
        resampled_count: n_buckets,
        missing_filled,
    };
    Ok((Series::new(grid_timestamps, grid)?, report))
}

/// Split a series sequentially into train and test windows.
///
/// The training window holds `floor(len * ratio)` observations; a split that
/// leaves either side empty is rejected.
pub fn train_test_split(series: &Series, ratio: f64) -> Result<(Series, Series)> {
    if series.is_empty() {
        return Err(AnalysisError::EmptyData);
    }
    if !ratio.is_finite() || ratio <= 0.0 || ratio >= 1.0 {
        return Err(AnalysisError::InvalidParameter(
            "split ratio must be strictly between 0 and 1".to_string(),
        ));
    }
    let n = series.len();
    let n_train = (n as f64 * ratio).floor() as usize;
    if n_train == 0 || n_train >= n {
        return Err(AnalysisError::InvalidParameter(format!(
            "split ratio {ratio} produces an empty train or test set for {n} observations"
        )));
    }
    Ok((series.slice(0, n_train)?, series.slice(n_train, n)?))
}

/// Linear interpolation across interior NaN gaps. Edge gaps are left for the
/// fill pass that follows.
fn interpolate_gaps(values: &mut [f64]) {
    let n = values.len();
    let mut i = 0;
    while i < n {
        if values[i].is_nan() {
            let start = i;
            while i < n && values[i].is_nan() {
                i += 1;
            }
            let end = i;
            if start > 0 && end < n {
                let left = values[start - 1];
                let right = values[end];
                let segments = (end - start + 1) as f64;
                for (j, idx) in (start..end).enumerate() {
                    let t = (j + 1) as f64 / segments;
                    values[idx] = left + t * (right - left);
                }
            }
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn series_at_minutes(minutes: &[i64], values: &[f64]) -> Series {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps = minutes.iter().map(|m| base + Duration::minutes(*m)).collect();
        Series::new(timestamps, values.to_vec()).unwrap()
    }

    #[test]
    fn resample_averages_within_buckets() {
        // Two observations in the first 5-minute bucket, one in the second.
        let series = series_at_minutes(&[0, 2, 5], &[10.0, 20.0, 30.0]);

        let (resampled, report) = resample(&series, Duration::minutes(5), ResampleMethod::Mean).unwrap();

        assert_eq!(resampled.len(), 2);
        assert_relative_eq!(resampled.values()[0], 15.0, epsilon = 1e-12);
        assert_relative_eq!(resampled.values()[1], 30.0, epsilon = 1e-12);
        assert_eq!(report.original_count, 3);
        assert_eq!(report.resampled_count, 2);
        assert_eq!(report.missing_filled, 0);
    }

    #[test]
    fn resample_forward_fills_empty_buckets() {
        // Buckets at 0 and 15 minutes observed, 5 and 10 empty.
        let series = series_at_minutes(&[0, 15], &[10.0, 40.0]);

        let (resampled, report) = resample(&series, Duration::minutes(5), ResampleMethod::Mean).unwrap();

        assert_eq!(resampled.len(), 4);
        assert_eq!(resampled.values(), &[10.0, 10.0, 10.0, 40.0]);
        assert_eq!(report.missing_filled, 2);
    }

    #[test]
    fn resample_linear_interpolates_gaps() {
        let series = series_at_minutes(&[0, 15], &[10.0, 40.0]);

        let (resampled, report) =
            resample(&series, Duration::minutes(5), ResampleMethod::Linear).unwrap();

        assert_eq!(resampled.len(), 4);
        assert_relative_eq!(resampled.values()[1], 20.0, epsilon = 1e-12);
        assert_relative_eq!(resampled.values()[2], 30.0, epsilon = 1e-12);
        assert_eq!(report.missing_filled, 0);
    }

    #[test]
    fn resample_last_observation_wins_for_forward_fill_method() {
        let series = series_at_minutes(&[0, 2, 5], &[10.0, 20.0, 30.0]);

        let (resampled, _) =
            resample(&series, Duration::minutes(5), ResampleMethod::ForwardFill).unwrap();

        assert_eq!(resampled.values(), &[20.0, 30.0]);
    }

    #[test]
    fn resample_grid_timestamps_are_bucket_aligned() {
        let series = series_at_minutes(&[3, 8], &[1.0, 2.0]);

        let (resampled, _) = resample(&series, Duration::minutes(5), ResampleMethod::Mean).unwrap();

        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(resampled.timestamps()[0], base);
        assert_eq!(resampled.timestamps()[1], base + Duration::minutes(5));
    }

    #[test]
    fn resample_rejects_bad_input() {
        let empty = Series::new(vec![], vec![]).unwrap();
        assert!(matches!(
            resample(&empty, Duration::minutes(5), ResampleMethod::Mean),
            Err(AnalysisError::EmptyData)
        ));

        let series = series_at_minutes(&[0], &[1.0]);
        assert!(matches!(
            resample(&series, Duration::zero(), ResampleMethod::Mean),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }

    #[test]
    fn split_is_sequential_and_floor_sized() {
        let series = series_at_minutes(&[0, 5, 10, 15, 20], &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let (train, test) = train_test_split(&series, 0.8).unwrap();

        assert_eq!(train.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(test.values(), &[5.0]);
    }

    #[test]
    fn split_rejects_degenerate_ratios() {
        let series = series_at_minutes(&[0, 5, 10], &[1.0, 2.0, 3.0]);

        assert!(matches!(
            train_test_split(&series, 0.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            train_test_split(&series, 1.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        // Floor of 3 * 0.1 is zero observations for training.
        assert!(matches!(
            train_test_split(&series, 0.1),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
