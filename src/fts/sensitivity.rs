//! Scenario sweep around a base fuzzy time series configuration.
//!
//! Re-runs the model under three parameter perturbations and reports how the
//! test-window MAPE moves relative to the base run. A scenario that fails to
//! fit (for example equal-frequency with too few distinct values) is skipped
//! rather than failing the sweep.

use crate::core::Series;
use crate::fts::chen::{FtsChen, FtsConfig};
use crate::fts::partition::PartitionMethod;
use serde::{Deserialize, Serialize};

/// One evaluated scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCase {
    pub id: String,
    pub label: String,
    pub description: String,
    pub config: FtsConfig,
    /// MAPE of the scenario run, `None` when undefined.
    pub mape: Option<f64>,
    /// `scenario_mape - base_mape` when both are defined.
    pub delta: Option<f64>,
}

/// Outcome of the full sweep, ordered best scenario first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub cases: Vec<SensitivityCase>,
    /// Id of the scenario with the lowest defined MAPE.
    pub best_case: Option<String>,
    pub baseline_mape: Option<f64>,
    /// Delta of the best scenario against the base run (negative means the
    /// scenario outperformed it).
    pub improvement: Option<f64>,
}

/// Run the three standard scenarios: two more intervals, the other partition
/// method, and five points more universe padding.
pub fn run_sensitivity_analysis(
    train: &Series,
    test: &Series,
    base: &FtsConfig,
    baseline_mape: Option<f64>,
) -> SensitivityReport {
    let alt_method = match base.method {
        PartitionMethod::EqualWidth => PartitionMethod::EqualFrequency,
        PartitionMethod::EqualFrequency => PartitionMethod::EqualWidth,
    };
    let scenarios = [
        (
            "case1",
            format!("n = {}", base.n_intervals + 2),
            format!(
                "Increase intervals by 2 ({} -> {})",
                base.n_intervals,
                base.n_intervals + 2
            ),
            FtsConfig {
                n_intervals: base.n_intervals + 2,
                ..*base
            },
        ),
        (
            "case2",
            format!("method = {alt_method:?}"),
            format!("Swap partition method ({:?} -> {alt_method:?})", base.method),
            FtsConfig {
                method: alt_method,
                ..*base
            },
        ),
        (
            "case3",
            format!("pad = {:.0}%", (base.pad_fraction + 0.05) * 100.0),
            format!(
                "Increase universe padding by 5% ({:.0}% -> {:.0}%)",
                base.pad_fraction * 100.0,
                (base.pad_fraction + 0.05) * 100.0
            ),
            FtsConfig {
                pad_fraction: base.pad_fraction + 0.05,
                ..*base
            },
        ),
    ];

    let mut cases = Vec::new();
    for (id, label, description, config) in scenarios {
        match FtsChen::fit_forecast(train, test, config) {
            Ok(forecast) => {
                let mape = forecast.evaluation.mape;
                let delta = match (mape, baseline_mape) {
                    (Some(m), Some(b)) => Some(m - b),
                    _ => None,
                };
                cases.push(SensitivityCase {
                    id: id.to_string(),
                    label,
                    description,
                    config,
                    mape,
                    delta,
                });
            }
            Err(err) => {
                tracing::warn!(scenario = id, error = %err, "sensitivity scenario skipped");
            }
        }
    }

    cases.sort_by(|a, b| {
        let a_key = a.mape.unwrap_or(f64::INFINITY);
        let b_key = b.mape.unwrap_or(f64::INFINITY);
        a_key.total_cmp(&b_key)
    });

    let best = cases.iter().find(|c| c.mape.is_some());
    let best_case = best.map(|c| c.id.clone());
    let improvement = best.and_then(|c| c.delta);

    SensitivityReport {
        cases,
        best_case,
        baseline_mape,
        improvement,
    }
}
