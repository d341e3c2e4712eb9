//! End-to-end tests for the staged analysis pipeline: readiness gating,
//! partial failure, cooperative cancellation, and the AR(1) scenario.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use powercast::core::Series;
use powercast::error::AnalysisError;
use powercast::fts::{FtsChen, FtsConfig, PartitionMethod};
use powercast::models::{ExternalModel, ExternalOutput};
use powercast::params::{
    AnnParams, ArimaParams, FamilyParams, FtsParams, GeneralParams, ParamSnapshot, ParameterGate,
};
use powercast::pipeline::{
    Orchestrator, PipelineEvent, RunStatus, Stage, StageContext, StageOutcome,
};
use powercast::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n).map(|i| base + Duration::minutes(5 * i as i64)).collect()
}

/// A wavy, strictly positive household-load-like series on a 5-minute grid.
fn make_series(n: usize) -> Series {
    let values: Vec<f64> = (0..n)
        .map(|i| 300.0 + 40.0 * (i as f64 * 0.3).sin() + (i % 5) as f64 * 3.0)
        .collect();
    Series::new(make_timestamps(n), values).unwrap()
}

fn ready_gate() -> Arc<ParameterGate> {
    let gate = Arc::new(ParameterGate::new());
    gate.submit(FamilyParams::General(GeneralParams::default())).unwrap();
    gate.submit(FamilyParams::Fts(FtsParams::default())).unwrap();
    gate.submit(FamilyParams::Ann(AnnParams::default())).unwrap();
    gate.submit(FamilyParams::Arima(ArimaParams::default())).unwrap();
    gate
}

/// Predicts the previous actual, like the naive baseline.
struct ShiftModel(&'static str);

impl ExternalModel for ShiftModel {
    fn name(&self) -> &'static str {
        self.0
    }

    fn run(
        &self,
        _train: &Series,
        test: &Series,
        _params: &ParamSnapshot,
        ctx: &StageContext,
    ) -> Result<ExternalOutput> {
        ctx.checkpoint()?;
        ctx.progress(50, "stub collaborator predicting");
        let mut predictions = vec![f64::NAN];
        predictions.extend_from_slice(&test.values()[..test.len() - 1]);
        Ok(ExternalOutput {
            predictions,
            diagnostics: BTreeMap::from([("elapsed_ms".to_string(), 1.0)]),
        })
    }
}

/// Always raises, standing in for a crashing collaborator.
struct FailingModel(&'static str);

impl ExternalModel for FailingModel {
    fn name(&self) -> &'static str {
        self.0
    }

    fn run(
        &self,
        _train: &Series,
        _test: &Series,
        _params: &ParamSnapshot,
        _ctx: &StageContext,
    ) -> Result<ExternalOutput> {
        Err(AnalysisError::InvalidParameter(
            "collaborator exploded".to_string(),
        ))
    }
}

/// Spins at its cancellation checkpoint until the run is cancelled.
struct BlockingModel(&'static str);

impl ExternalModel for BlockingModel {
    fn name(&self) -> &'static str {
        self.0
    }

    fn run(
        &self,
        _train: &Series,
        _test: &Series,
        _params: &ParamSnapshot,
        ctx: &StageContext,
    ) -> Result<ExternalOutput> {
        loop {
            ctx.checkpoint()?;
            std::thread::sleep(StdDuration::from_millis(5));
        }
    }
}

fn orchestrator_with(
    ann: Arc<dyn ExternalModel>,
    arima: Arc<dyn ExternalModel>,
) -> Orchestrator {
    Orchestrator::new(ready_gate(), ann, arima)
}

#[tokio::test]
async fn full_run_reports_every_stage_and_a_summary() {
    let orchestrator = orchestrator_with(
        Arc::new(ShiftModel("AnnStub")),
        Arc::new(ShiftModel("ArimaStub")),
    );

    let run = orchestrator.spawn(make_series(150)).unwrap().wait().await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.stages.len(), 4);
    for stage in [Stage::Baseline, Stage::Fts, Stage::Ann, Stage::Arima] {
        assert!(run.stage(stage).unwrap().outcome.is_success());
    }

    let preprocessing = run.preprocessing.as_ref().unwrap();
    assert_eq!(preprocessing.n_train + preprocessing.n_test, 150);
    assert_eq!(preprocessing.dropped_non_finite, 0);

    // Naive + MovingAverage + FtsChen + two stubs.
    let summary = run.summary();
    assert_eq!(summary.len(), 5);
    assert!(summary.iter().all(|line| line.mae.is_finite() && line.mae >= 0.0));

    let sweep = run.sensitivity.as_ref().unwrap();
    assert!(!sweep.cases.is_empty());
}

#[tokio::test]
async fn cancellation_during_arima_preserves_earlier_results() {
    let orchestrator = orchestrator_with(
        Arc::new(ShiftModel("AnnStub")),
        Arc::new(BlockingModel("ArimaStub")),
    );
    let mut events = orchestrator.subscribe();

    let handle = orchestrator.spawn(make_series(150)).unwrap();

    // Wait until the ARIMA stage is underway, then request cancellation.
    loop {
        match events.recv().await.unwrap() {
            PipelineEvent::StageStarted { stage: Stage::Arima, .. } => break,
            _ => continue,
        }
    }
    handle.cancel();
    let run = handle.wait().await.unwrap();

    assert_eq!(run.status, RunStatus::Cancelled);
    assert!(run.stage(Stage::Baseline).unwrap().outcome.is_success());
    assert!(run.stage(Stage::Fts).unwrap().outcome.is_success());
    assert!(run.stage(Stage::Ann).unwrap().outcome.is_success());
    assert!(run.stage(Stage::Arima).is_none());
}

#[tokio::test]
async fn failing_collaborator_is_recorded_and_the_run_continues() {
    let orchestrator = orchestrator_with(
        Arc::new(FailingModel("AnnStub")),
        Arc::new(ShiftModel("ArimaStub")),
    );

    let run = orchestrator.spawn(make_series(150)).unwrap().wait().await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    match &run.stage(Stage::Ann).unwrap().outcome {
        StageOutcome::Failed { cause } => {
            assert!(cause.contains("ann"), "unexpected cause: {cause}");
            assert!(cause.contains("collaborator exploded"));
        }
        StageOutcome::Succeeded { .. } => panic!("ANN stage should have failed"),
    }
    // The failure stayed local: ARIMA still ran and succeeded.
    assert!(run.stage(Stage::Arima).unwrap().outcome.is_success());
}

#[tokio::test]
async fn a_second_run_is_rejected_while_one_is_in_flight() {
    let orchestrator = orchestrator_with(
        Arc::new(ShiftModel("AnnStub")),
        Arc::new(BlockingModel("ArimaStub")),
    );
    let mut events = orchestrator.subscribe();

    let handle = orchestrator.spawn(make_series(150)).unwrap();
    loop {
        match events.recv().await.unwrap() {
            PipelineEvent::StageStarted { stage: Stage::Arima, .. } => break,
            _ => continue,
        }
    }

    // Starting another run fails fast rather than queuing.
    assert_eq!(
        orchestrator.spawn(make_series(150)).unwrap_err(),
        AnalysisError::RunInFlight
    );
    // Parameter changes are rejected while the run holds the snapshot.
    assert_eq!(
        orchestrator.gate().submit(FamilyParams::Fts(FtsParams::default())),
        Err(AnalysisError::RunInFlight)
    );
    assert_eq!(
        orchestrator.gate().unlock(powercast::params::Family::Arima),
        Err(AnalysisError::RunInFlight)
    );

    handle.cancel();
    let run = handle.wait().await.unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);

    // Once the run finalizes the gate accepts work again.
    let handle = orchestrator.spawn(make_series(150)).unwrap();
    handle.cancel();
    handle.wait().await.unwrap();
}

#[tokio::test]
async fn events_follow_the_stage_lifecycle() {
    let orchestrator = orchestrator_with(
        Arc::new(ShiftModel("AnnStub")),
        Arc::new(ShiftModel("ArimaStub")),
    );
    let mut events = orchestrator.subscribe();

    let handle = orchestrator.spawn(make_series(150)).unwrap();
    let mut seen = Vec::new();
    loop {
        let event = events.recv().await.unwrap();
        let done = matches!(event, PipelineEvent::RunCompleted { .. });
        seen.push(event);
        if done {
            break;
        }
    }
    handle.wait().await.unwrap();

    assert!(matches!(
        seen.first().unwrap(),
        PipelineEvent::StageStarted { stage: Stage::Preprocessing, .. }
    ));

    for stage in [Stage::Preprocessing, Stage::Baseline, Stage::Fts, Stage::Ann, Stage::Arima] {
        let started = seen.iter().position(
            |e| matches!(e, PipelineEvent::StageStarted { stage: s, .. } if *s == stage),
        );
        let finished = seen.iter().position(
            |e| matches!(e, PipelineEvent::StageFinished { stage: s, .. } if *s == stage),
        );
        assert!(started.unwrap() < finished.unwrap(), "stage {stage} out of order");
    }

    let progress_count = seen
        .iter()
        .filter(|e| matches!(e, PipelineEvent::StageProgress { .. }))
        .count();
    assert!(progress_count > 0);
}

#[tokio::test]
async fn run_record_serializes_for_persistence() {
    let orchestrator = orchestrator_with(
        Arc::new(ShiftModel("AnnStub")),
        Arc::new(ShiftModel("ArimaStub")),
    );

    let run = orchestrator.spawn(make_series(150)).unwrap().wait().await.unwrap();

    let json = serde_json::to_string(&run).unwrap();
    for fragment in ["baseline", "fts", "ann", "arima", "FtsChen", "Naive"] {
        assert!(json.contains(fragment), "missing {fragment} in record");
    }
}

#[test]
fn ar1_scenario_end_to_end() {
    // 100 training points from a known AR(1) process, plus a held-out window.
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 1.0).unwrap();
    let mut values = Vec::with_capacity(130);
    let mut x = 50.0;
    for _ in 0..130 {
        x = 10.0 + 0.8 * x + noise.sample(&mut rng);
        values.push(x);
    }
    let timestamps = make_timestamps(130);
    let series = Series::new(timestamps, values).unwrap();
    let train = series.slice(0, 100).unwrap();
    let test = series.slice(100, 130).unwrap();

    let config = FtsConfig {
        n_intervals: 9,
        method: PartitionMethod::EqualWidth,
        pad_fraction: 0.1,
        sensitivity: 1.0,
    };
    let out = FtsChen::fit_forecast(&train, &test, config).unwrap();

    assert!(out.predictions[0].is_none());
    let (lo, hi) = out.diagnostics.uod;
    for prediction in out.predictions[1..].iter().copied() {
        let value = prediction.expect("all positions after the first are forecast");
        assert!(value >= lo && value <= hi);
    }
    assert!(out.evaluation.mae.is_finite());
    assert!(out.evaluation.mae >= 0.0);
    assert_eq!(out.evaluation.n_used, 29);
}
