//! The pipeline run record: stage results, diagnostics, terminal status.

use crate::metrics::Evaluation;
use crate::fts::SensitivityReport;
use crate::params::ParamSnapshot;
use crate::preprocess::ResampleReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier of one pipeline run.
pub type RunId = Uuid;

/// One forecasting technique's slot in the staged execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preprocessing,
    Baseline,
    Fts,
    Ann,
    Arima,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Preprocessing => "preprocessing",
            Stage::Baseline => "baseline",
            Stage::Fts => "fts",
            Stage::Ann => "ann",
            Stage::Arima => "arima",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every stage was attempted; individual stages may still have failed.
    Completed,
    /// Cancellation was observed before the run could finish.
    Cancelled,
    /// A precondition was violated before any forecasting stage ran.
    Failed { cause: String },
}

/// One model's forecast within a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Display name of the model that produced the forecast.
    pub model: String,
    /// Index-aligned predictions over the test window; absent positions are
    /// excluded from the evaluation.
    pub predictions: Vec<Option<f64>>,
    pub evaluation: Evaluation,
    /// Model-specific diagnostics as a structured value.
    pub diagnostics: serde_json::Value,
}

/// What happened to one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded { results: Vec<StageResult> },
    Failed { cause: String },
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Succeeded { .. })
    }
}

/// A finalized stage entry in the run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Counts produced by the preprocessing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessReport {
    /// Observations dropped because the target value was NaN or infinite.
    pub dropped_non_finite: usize,
    pub resample: ResampleReport,
    pub n_train: usize,
    pub n_test: usize,
    pub split_ratio: f64,
}

/// One line of the comparative accuracy summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: Stage,
    pub model: String,
    pub mae: f64,
    pub rmse: f64,
    pub mape: Option<f64>,
}

/// The immutable record of one staged analysis over a fixed series and a
/// locked parameter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The snapshot the run executed against.
    pub params: ParamSnapshot,
    /// Present when preprocessing completed.
    pub preprocessing: Option<PreprocessReport>,
    /// Finalized forecasting stages, in execution order. A cancelled run
    /// keeps whatever stages finished before the cancellation was observed.
    pub stages: Vec<StageRecord>,
    /// Scenario sweep around the fuzzy time series configuration.
    pub sensitivity: Option<SensitivityReport>,
    pub status: RunStatus,
}

impl PipelineRun {
    /// Find the record for one stage, if it was finalized.
    pub fn stage(&self, stage: Stage) -> Option<&StageRecord> {
        self.stages.iter().find(|record| record.stage == stage)
    }

    /// Comparative accuracy lines for every successful model result.
    pub fn summary(&self) -> Vec<StageSummary> {
        self.stages
            .iter()
            .filter_map(|record| match &record.outcome {
                StageOutcome::Succeeded { results } => Some((record.stage, results)),
                StageOutcome::Failed { .. } => None,
            })
            .flat_map(|(stage, results)| {
                results.iter().map(move |result| StageSummary {
                    stage,
                    model: result.model.clone(),
                    mae: result.evaluation.mae,
                    rmse: result.evaluation.rmse,
                    mape: result.evaluation.mape,
                })
            })
            .collect()
    }
}
