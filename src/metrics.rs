//! Error statistics for comparing forecasts against observed values.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Error statistics for one (actual, predicted) pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Mean Absolute Error.
    pub mae: f64,
    /// Mean Squared Error.
    pub mse: f64,
    /// Root Mean Squared Error.
    pub rmse: f64,
    /// Mean Absolute Percentage Error, `None` when every usable position
    /// had `actual == 0`.
    pub mape: Option<f64>,
    /// Positions that entered MAE/MSE/RMSE.
    pub n_used: usize,
    /// Positions excluded from MAPE because `actual == 0`.
    pub n_ignored: usize,
}

/// Compute error statistics between actuals and index-aligned predictions.
///
/// Both sequences must have the same length. Positions where the prediction
/// is absent, or where either side is non-finite, are excluded from every
/// statistic — the first one-step-ahead forecast has no prior state and is
/// reported absent by the models. For MAPE, positions with `actual == 0` are
/// additionally skipped and counted in `n_ignored`.
pub fn evaluate(actual: &[f64], predicted: &[Option<f64>]) -> Result<Evaluation> {
    if actual.len() != predicted.len() {
        return Err(AnalysisError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(AnalysisError::EmptyData);
    }

    let pairs: Vec<(f64, f64)> = actual
        .iter()
        .zip(predicted.iter())
        .filter_map(|(a, p)| match p {
            Some(p) if a.is_finite() && p.is_finite() => Some((*a, *p)),
            _ => None,
        })
        .collect();

    let n_used = pairs.len();
    if n_used == 0 {
        return Ok(Evaluation {
            mae: 0.0,
            mse: 0.0,
            rmse: 0.0,
            mape: None,
            n_used: 0,
            n_ignored: 0,
        });
    }

    let n = n_used as f64;
    let mae = pairs.iter().map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
    let mse = pairs.iter().map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n;
    let rmse = mse.sqrt();

    let mape_pairs: Vec<&(f64, f64)> = pairs.iter().filter(|(a, _)| *a != 0.0).collect();
    let n_ignored = n_used - mape_pairs.len();
    let mape = if mape_pairs.is_empty() {
        None
    } else {
        let sum: f64 = mape_pairs.iter().map(|(a, p)| ((a - p) / a).abs()).sum();
        Some(100.0 * sum / mape_pairs.len() as f64)
    };

    Ok(Evaluation {
        mae,
        mse,
        rmse,
        mape,
        n_used,
        n_ignored,
    })
}
