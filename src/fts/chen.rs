//! First-order fuzzy time series forecasting (Chen 1996).
//!
//! The model partitions the training range into intervals, learns which
//! interval tends to follow which, and forecasts one step ahead by blending
//! the no-change (naive) forecast with the defuzzified successor midpoint.

use crate::core::Series;
use crate::error::{AnalysisError, Result};
use crate::fts::flrg::{fuzzify, Flrg, LabelIndex, SupportEntry};
use crate::fts::partition::{Interval, Partition, PartitionMethod};
use crate::metrics::{evaluate, Evaluation};
use serde::{Deserialize, Serialize};

/// Configuration for one fuzzy time series fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FtsConfig {
    /// Number of intervals the universe is divided into.
    pub n_intervals: usize,
    /// Partitioning policy.
    pub method: PartitionMethod,
    /// Fraction of the observed span padded onto each side of the universe.
    pub pad_fraction: f64,
    /// Blend factor between the naive and the defuzzified forecast.
    ///
    /// `0` collapses to pure naive forecasting; values above `1` are allowed
    /// and may push a forecast past the defuzzified value before the result
    /// is clamped into the universe bounds.
    pub sensitivity: f64,
}

impl Default for FtsConfig {
    fn default() -> Self {
        Self {
            n_intervals: 7,
            method: PartitionMethod::EqualWidth,
            pad_fraction: 0.05,
            sensitivity: 1.0,
        }
    }
}

/// Forecast output with self-evaluation and model diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtsForecast {
    /// One-step-ahead forecasts aligned to the test window; the first
    /// position has no prior observation and is absent.
    pub predictions: Vec<Option<f64>>,
    /// Metrics against the test window, absent positions excluded.
    pub evaluation: Evaluation,
    pub diagnostics: FtsDiagnostics,
}

/// Fitted-model internals reported for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtsDiagnostics {
    pub uod: (f64, f64),
    pub n_intervals: usize,
    pub partition_method: PartitionMethod,
    pub pad_fraction: f64,
    pub sensitivity: f64,
    pub intervals: Vec<Interval>,
    pub midpoints: Vec<f64>,
    /// Number of consecutive-pair transitions observed in training.
    pub transition_count: u32,
    /// Per-label successor supports, descending by share.
    pub support: Vec<Vec<SupportEntry>>,
}

#[derive(Debug, Clone)]
struct FittedState {
    partition: Partition,
    flrg: Flrg,
}

/// First-order Chen-style fuzzy time series model.
#[derive(Debug, Clone)]
pub struct FtsChen {
    config: FtsConfig,
    fitted: Option<FittedState>,
}

impl FtsChen {
    pub fn new(config: FtsConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    pub fn config(&self) -> &FtsConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Partition the universe and learn the relationship groups.
    pub fn fit(&mut self, train: &Series) -> Result<()> {
        if !self.config.sensitivity.is_finite() || self.config.sensitivity < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "sensitivity must be a non-negative number, got {}",
                self.config.sensitivity
            )));
        }
        if train.len() < 2 {
            return Err(AnalysisError::InsufficientData {
                needed: 2,
                got: train.len(),
            });
        }

        let partition = Partition::build(
            train.values(),
            self.config.method,
            self.config.n_intervals,
            self.config.pad_fraction,
        )?;
        let labels = fuzzify(train.values(), &partition);
        let flrg = Flrg::build(&labels, partition.len());

        self.fitted = Some(FittedState { partition, flrg });
        Ok(())
    }

    /// Forecast each test position from the actual value one step earlier.
    ///
    /// The forecast is always re-grounded on the observed `t-1` value, never
    /// on the model's own prior output, so the first position is absent.
    pub fn forecast(&self, test: &Series) -> Result<FtsForecast> {
        let fitted = self.fitted.as_ref().ok_or(AnalysisError::FitRequired)?;
        if test.is_empty() {
            return Err(AnalysisError::EmptyData);
        }

        let actuals = test.values();
        let mut predictions: Vec<Option<f64>> = Vec::with_capacity(actuals.len());
        predictions.push(None);
        for t in 1..actuals.len() {
            let naive = actuals[t - 1];
            let label = fitted.partition.label_of(naive);
            let defuzzified = defuzzify(&fitted.partition, &fitted.flrg, label);
            let blended = naive + self.config.sensitivity * (defuzzified - naive);
            predictions.push(Some(fitted.partition.clamp(blended)));
        }

        let evaluation = evaluate(actuals, &predictions)?;
        let diagnostics = FtsDiagnostics {
            uod: fitted.partition.uod(),
            n_intervals: fitted.partition.len(),
            partition_method: self.config.method,
            pad_fraction: self.config.pad_fraction,
            sensitivity: self.config.sensitivity,
            intervals: fitted.partition.intervals().to_vec(),
            midpoints: fitted.partition.midpoints(),
            transition_count: fitted.flrg.transition_count(),
            support: fitted.flrg.support(),
        };

        Ok(FtsForecast {
            predictions,
            evaluation,
            diagnostics,
        })
    }

    /// Fit on the training window and forecast the test window in one call.
    pub fn fit_forecast(train: &Series, test: &Series, config: FtsConfig) -> Result<FtsForecast> {
        let mut model = Self::new(config);
        model.fit(train)?;
        model.forecast(test)
    }
}

/// Support-weighted average of the successor midpoints; a label with no
/// observed successors defuzzifies to its own midpoint.
fn defuzzify(partition: &Partition, flrg: &Flrg, label: LabelIndex) -> f64 {
    if flrg.is_terminal(label) {
        return partition.midpoint(label);
    }
    let total = flrg.total_from(label) as f64;
    flrg.successors(label)
        .iter()
        .map(|(successor, count)| partition.midpoint(*successor) * *count as f64 / total)
        .sum()
}
