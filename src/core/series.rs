//! Series data structure for representing a univariate time series.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Utc};

/// A univariate time series: timestamps paired with numeric observations.
///
/// Timestamps are validated to be strictly increasing. The pipeline borrows
/// a `Series` and never mutates it; transformations produce new instances.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl Series {
    /// Create a new series, validating timestamp ordering and lengths.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(AnalysisError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        Ok(Self { timestamps, values })
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get observed values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the last observed value, if any.
    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Extract a half-open slice `[start, end)` of the series.
    pub fn slice(&self, start: usize, end: usize) -> Result<Series> {
        if start > end {
            return Err(AnalysisError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(AnalysisError::InvalidParameter(format!(
                "slice end {} exceeds series length {}",
                end,
                self.len()
            )));
        }
        Ok(Series {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Return a copy with NaN/infinite observations removed, plus the number
    /// of observations that were dropped.
    pub fn retain_finite(&self) -> (Series, usize) {
        let mut timestamps = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        for (ts, v) in self.timestamps.iter().zip(self.values.iter()) {
            if v.is_finite() {
                timestamps.push(*ts);
                values.push(*v);
            }
        }
        let dropped = self.len() - values.len();
        (Series { timestamps, values }, dropped)
    }
}
