//! Staged execution of one analysis run on a background context.
//!
//! The orchestrator sequences Preprocessing, Baseline, FTS, ANN, and ARIMA
//! strictly one after another on a blocking worker thread, so long-running
//! stages never stall progress reporting or cancellation requests arriving
//! from the interactive context. A stage failure is recorded in that stage's
//! record and the run moves on; only a violated precondition before the
//! forecasting stages (missing readiness, empty split) fails the whole run.
//! Cancellation is request-then-acknowledge: observers set the token, the
//! run observes it between stages and at checkpoints inside them.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::core::Series;
use crate::error::{AnalysisError, Result};
use crate::fts::{run_sensitivity_analysis, FtsChen, SensitivityReport};
use crate::metrics::evaluate;
use crate::models::{moving_average_forecast, naive_forecast, ExternalModel};
use crate::params::{ParamSnapshot, ParameterGate};
use crate::pipeline::events::{EventBus, PipelineEvent};
use crate::pipeline::run::{
    PipelineRun, PreprocessReport, RunId, RunStatus, Stage, StageOutcome, StageRecord, StageResult,
};
use crate::preprocess::{resample, train_test_split};

/// Fixed grid the preprocessing stage resamples onto.
pub const RESAMPLE_INTERVAL_MINUTES: i64 = 5;

/// Per-stage handle given to stage code and external collaborators.
///
/// Offers cooperative cancellation checkpoints and progress reporting; both
/// are cheap and safe to call from a blocking context.
pub struct StageContext {
    run_id: RunId,
    stage: Stage,
    cancel: CancellationToken,
    bus: EventBus,
}

impl StageContext {
    fn new(run_id: RunId, stage: Stage, cancel: CancellationToken, bus: EventBus) -> Self {
        Self {
            run_id,
            stage,
            cancel,
            bus,
        }
    }

    /// Observe a pending cancellation request, if any.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Report stage progress to observers.
    pub fn progress(&self, percent: u8, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(
            run_id = %self.run_id,
            stage = %self.stage,
            percent,
            "{message}"
        );
        self.bus.publish(PipelineEvent::StageProgress {
            run_id: self.run_id,
            stage: self.stage,
            percent,
            message,
        });
    }
}

/// Handle to a spawned run: cancel it or wait for the finalized record.
#[derive(Debug)]
pub struct RunHandle {
    pub id: RunId,
    cancel: CancellationToken,
    join: JoinHandle<PipelineRun>,
}

impl RunHandle {
    /// Request cooperative cancellation. The run acknowledges at its next
    /// checkpoint; already-finalized stage results are preserved.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to finalize and take the immutable record.
    pub async fn wait(self) -> Result<PipelineRun> {
        self.join.await.map_err(|err| AnalysisError::StageExecution {
            stage: "pipeline".to_string(),
            message: err.to_string(),
        })
    }
}

/// Sequences the forecasting stages over one series and one locked
/// parameter snapshot.
pub struct Orchestrator {
    gate: Arc<ParameterGate>,
    bus: EventBus,
    ann: Arc<dyn ExternalModel>,
    arima: Arc<dyn ExternalModel>,
}

impl Orchestrator {
    pub fn new(
        gate: Arc<ParameterGate>,
        ann: Arc<dyn ExternalModel>,
        arima: Arc<dyn ExternalModel>,
    ) -> Self {
        Self {
            gate,
            bus: EventBus::default(),
            ann,
            arima,
        }
    }

    /// Subscribe to run lifecycle events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PipelineEvent> {
        self.bus.subscribe()
    }

    /// The shared readiness gate.
    pub fn gate(&self) -> &Arc<ParameterGate> {
        &self.gate
    }

    /// Start a run on the background context.
    ///
    /// Fails fast with `NotReady` unless every parameter family is locked,
    /// and with `RunInFlight` while another run holds the snapshot — a
    /// second run is never queued.
    pub fn spawn(&self, series: Series) -> Result<RunHandle> {
        let snapshot = self.gate.begin_run()?;
        let run_id = Uuid::now_v7();
        let cancel = CancellationToken::new();

        let bus = self.bus.clone();
        let gate = Arc::clone(&self.gate);
        let ann = Arc::clone(&self.ann);
        let arima = Arc::clone(&self.arima);
        let token = cancel.clone();
        let join = tokio::task::spawn_blocking(move || {
            let run = execute(run_id, &series, snapshot, &bus, &token, &*ann, &*arima);
            gate.end_run();
            run
        });

        Ok(RunHandle {
            id: run_id,
            cancel,
            join,
        })
    }
}

enum Flow {
    Continue,
    Cancelled,
}

/// Run the full staged pipeline to a finalized record. Never panics out of
/// stage failures; the record carries the terminal status.
fn execute(
    run_id: RunId,
    series: &Series,
    snapshot: ParamSnapshot,
    bus: &EventBus,
    cancel: &CancellationToken,
    ann: &dyn ExternalModel,
    arima: &dyn ExternalModel,
) -> PipelineRun {
    let started_at = Utc::now();
    tracing::info!(
        run_id = %run_id,
        target = %snapshot.general.target_variable,
        horizon = snapshot.general.forecast_horizon,
        "pipeline run started"
    );

    let mut stages: Vec<StageRecord> = Vec::new();
    let mut sensitivity: Option<SensitivityReport> = None;
    let mut preprocessing: Option<PreprocessReport> = None;

    let status = run_stages(
        run_id,
        series,
        &snapshot,
        bus,
        cancel,
        ann,
        arima,
        &mut stages,
        &mut sensitivity,
        &mut preprocessing,
    );

    finalize(
        run_id,
        started_at,
        snapshot,
        preprocessing,
        stages,
        sensitivity,
        status,
        bus,
    )
}

/// Drive the stage sequence, accumulating records as stages finalize, and
/// return the terminal status.
#[allow(clippy::too_many_arguments)]
fn run_stages(
    run_id: RunId,
    series: &Series,
    snapshot: &ParamSnapshot,
    bus: &EventBus,
    cancel: &CancellationToken,
    ann: &dyn ExternalModel,
    arima: &dyn ExternalModel,
    stages: &mut Vec<StageRecord>,
    sensitivity: &mut Option<SensitivityReport>,
    preprocessing: &mut Option<PreprocessReport>,
) -> RunStatus {
    // Preprocessing: a failure here is a violated precondition and fails
    // the whole run.
    bus.publish(PipelineEvent::StageStarted {
        run_id,
        stage: Stage::Preprocessing,
    });
    let prep_ctx = StageContext::new(run_id, Stage::Preprocessing, cancel.clone(), bus.clone());
    let (train, test, report) = match preprocess_stage(series, snapshot, &prep_ctx) {
        Ok(prepared) => prepared,
        Err(AnalysisError::Cancelled) => return RunStatus::Cancelled,
        Err(err) => {
            tracing::error!(run_id = %run_id, error = %err, "preprocessing failed, aborting run");
            return RunStatus::Failed {
                cause: err.to_string(),
            };
        }
    };
    bus.publish(PipelineEvent::StageFinished {
        run_id,
        stage: Stage::Preprocessing,
        outcome: StageOutcome::Succeeded { results: vec![] },
    });
    *preprocessing = Some(report);

    // Baseline comparisons.
    let window = snapshot.fts.interval.max(2) as usize;
    let flow = run_stage(run_id, Stage::Baseline, bus, cancel, stages, |ctx| {
        ctx.progress(50, "running naive and moving-average baselines");
        baseline_stage(&train, &test, window)
    });
    if matches!(flow, Flow::Cancelled) {
        return RunStatus::Cancelled;
    }

    // Fuzzy time series, including the sensitivity scenario sweep.
    let flow = run_stage(run_id, Stage::Fts, bus, cancel, stages, |ctx| {
        let (results, sweep) = fts_stage(&train, &test, snapshot, ctx)?;
        *sensitivity = Some(sweep);
        Ok(results)
    });
    if matches!(flow, Flow::Cancelled) {
        return RunStatus::Cancelled;
    }

    // External collaborators, one opaque call each.
    for (stage, model) in [(Stage::Ann, ann), (Stage::Arima, arima)] {
        let flow = run_stage(run_id, stage, bus, cancel, stages, |ctx| {
            external_stage(model, &train, &test, snapshot, stage, ctx)
        });
        if matches!(flow, Flow::Cancelled) {
            return RunStatus::Cancelled;
        }
    }

    RunStatus::Completed
}

/// Execute one forecasting stage: start event, stage body, finish event,
/// record. A `Cancelled` error aborts without recording the stage; any other
/// error becomes that stage's failure and the run continues.
fn run_stage<F>(
    run_id: RunId,
    stage: Stage,
    bus: &EventBus,
    cancel: &CancellationToken,
    stages: &mut Vec<StageRecord>,
    body: F,
) -> Flow
where
    F: FnOnce(&StageContext) -> Result<Vec<StageResult>>,
{
    if cancel.is_cancelled() {
        return Flow::Cancelled;
    }
    bus.publish(PipelineEvent::StageStarted { run_id, stage });
    tracing::info!(run_id = %run_id, stage = %stage, "stage started");

    let ctx = StageContext::new(run_id, stage, cancel.clone(), bus.clone());
    let outcome = match body(&ctx) {
        Ok(results) => StageOutcome::Succeeded { results },
        Err(AnalysisError::Cancelled) => {
            tracing::info!(run_id = %run_id, stage = %stage, "stage observed cancellation");
            return Flow::Cancelled;
        }
        Err(err) => {
            tracing::warn!(run_id = %run_id, stage = %stage, error = %err, "stage failed, run continues");
            StageOutcome::Failed {
                cause: err.to_string(),
            }
        }
    };

    bus.publish(PipelineEvent::StageFinished {
        run_id,
        stage,
        outcome: outcome.clone(),
    });
    stages.push(StageRecord { stage, outcome });
    Flow::Continue
}

fn preprocess_stage(
    series: &Series,
    snapshot: &ParamSnapshot,
    ctx: &StageContext,
) -> Result<(Series, Series, PreprocessReport)> {
    ctx.checkpoint()?;
    ctx.progress(10, "dropping non-finite observations");
    let (clean, dropped) = series.retain_finite();
    if clean.is_empty() {
        return Err(AnalysisError::EmptyData);
    }

    ctx.progress(
        30,
        format!("resampling onto a {RESAMPLE_INTERVAL_MINUTES}-minute grid"),
    );
    let (resampled, resample_report) = resample(
        &clean,
        Duration::minutes(RESAMPLE_INTERVAL_MINUTES),
        snapshot.general.resample_method,
    )?;

    ctx.progress(
        60,
        format!("sequential split at ratio {}", snapshot.general.split_ratio),
    );
    let (train, test) = train_test_split(&resampled, snapshot.general.split_ratio)?;
    ctx.progress(100, "preprocessing complete");

    let report = PreprocessReport {
        dropped_non_finite: dropped,
        resample: resample_report,
        n_train: train.len(),
        n_test: test.len(),
        split_ratio: snapshot.general.split_ratio,
    };
    Ok((train, test, report))
}

fn baseline_stage(train: &Series, test: &Series, window: usize) -> Result<Vec<StageResult>> {
    let naive = naive_forecast(train, test);
    let naive_evaluation = evaluate(test.values(), &naive)?;

    let ma = moving_average_forecast(train, test, window);
    let ma_evaluation = evaluate(test.values(), &ma)?;

    Ok(vec![
        StageResult {
            model: "Naive".to_string(),
            predictions: naive,
            evaluation: naive_evaluation,
            diagnostics: serde_json::json!({}),
        },
        StageResult {
            model: format!("MovingAverage({window})"),
            predictions: ma,
            evaluation: ma_evaluation,
            diagnostics: serde_json::json!({ "window": window }),
        },
    ])
}

fn fts_stage(
    train: &Series,
    test: &Series,
    snapshot: &ParamSnapshot,
    ctx: &StageContext,
) -> Result<(Vec<StageResult>, SensitivityReport)> {
    ctx.checkpoint()?;
    ctx.progress(10, "building universe partition and relationship groups");
    let config = snapshot.fts.to_config();
    let forecast = FtsChen::fit_forecast(train, test, config)?;

    ctx.progress(70, "forecast complete, sweeping sensitivity scenarios");
    ctx.checkpoint()?;
    let sweep = run_sensitivity_analysis(train, test, &config, forecast.evaluation.mape);

    let diagnostics =
        serde_json::to_value(&forecast.diagnostics).unwrap_or(serde_json::Value::Null);
    let result = StageResult {
        model: "FtsChen".to_string(),
        predictions: forecast.predictions,
        evaluation: forecast.evaluation,
        diagnostics,
    };
    Ok((vec![result], sweep))
}

fn external_stage(
    model: &dyn ExternalModel,
    train: &Series,
    test: &Series,
    snapshot: &ParamSnapshot,
    stage: Stage,
    ctx: &StageContext,
) -> Result<Vec<StageResult>> {
    ctx.checkpoint()?;
    let output = model.run(train, test, snapshot, ctx).map_err(|err| match err {
        AnalysisError::Cancelled => AnalysisError::Cancelled,
        other => AnalysisError::StageExecution {
            stage: stage.name().to_string(),
            message: other.to_string(),
        },
    })?;

    // Warm-up positions a collaborator could not forecast arrive as
    // non-finite values and are treated as absent.
    let predictions: Vec<Option<f64>> = output
        .predictions
        .iter()
        .map(|v| v.is_finite().then_some(*v))
        .collect();
    let evaluation = evaluate(test.values(), &predictions)?;
    let diagnostics =
        serde_json::to_value(&output.diagnostics).unwrap_or(serde_json::Value::Null);

    Ok(vec![StageResult {
        model: model.name().to_string(),
        predictions,
        evaluation,
        diagnostics,
    }])
}

#[allow(clippy::too_many_arguments)]
fn finalize(
    run_id: RunId,
    started_at: DateTime<Utc>,
    params: ParamSnapshot,
    preprocessing: Option<PreprocessReport>,
    stages: Vec<StageRecord>,
    sensitivity: Option<SensitivityReport>,
    status: RunStatus,
    bus: &EventBus,
) -> PipelineRun {
    let run = PipelineRun {
        id: run_id,
        started_at,
        finished_at: Utc::now(),
        params,
        preprocessing,
        stages,
        sensitivity,
        status,
    };
    match &run.status {
        RunStatus::Completed => {
            tracing::info!(run_id = %run_id, stages = run.stages.len(), "pipeline run completed");
            bus.publish(PipelineEvent::RunCompleted {
                run_id,
                summary: run.summary(),
            });
        }
        RunStatus::Cancelled => {
            tracing::info!(run_id = %run_id, stages = run.stages.len(), "pipeline run cancelled");
            bus.publish(PipelineEvent::RunCancelled { run_id });
        }
        RunStatus::Failed { cause } => {
            tracing::error!(run_id = %run_id, cause = %cause, "pipeline run failed");
            bus.publish(PipelineEvent::RunFailed {
                run_id,
                cause: cause.clone(),
            });
        }
    }
    run
}
