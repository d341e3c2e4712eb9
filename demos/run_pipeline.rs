//! End-to-end demo: lock parameters, run the staged pipeline over a
//! synthetic household power series, and print the comparative summary.
//!
//! ```sh
//! cargo run --example run_pipeline
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use powercast::core::Series;
use powercast::models::{moving_average_forecast, ExternalModel, ExternalOutput};
use powercast::params::{
    AnnParams, ArimaParams, FamilyParams, FtsParams, GeneralParams, ParamSnapshot, ParameterGate,
};
use powercast::pipeline::{Orchestrator, PipelineEvent, StageContext};
use powercast::Result;

/// Stands in for the opaque ANN/ARIMA collaborators: a trailing moving
/// average with a fixed window.
struct SmoothingStub {
    name: &'static str,
    window: usize,
}

impl ExternalModel for SmoothingStub {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(
        &self,
        train: &Series,
        test: &Series,
        _params: &ParamSnapshot,
        ctx: &StageContext,
    ) -> Result<ExternalOutput> {
        ctx.checkpoint()?;
        ctx.progress(50, format!("smoothing with window {}", self.window));
        let predictions = moving_average_forecast(train, test, self.window)
            .into_iter()
            .map(|p| p.unwrap_or(f64::NAN))
            .collect();
        Ok(ExternalOutput {
            predictions,
            diagnostics: BTreeMap::from([("window".to_string(), self.window as f64)]),
        })
    }
}

/// A day of synthetic 5-minute household power draw: a daily cycle plus a
/// kettle-sized ripple.
fn synthetic_power_series(n: usize) -> Series {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<DateTime<Utc>> = (0..n)
        .map(|i| base + Duration::minutes(5 * i as i64))
        .collect();
    let values: Vec<f64> = (0..n)
        .map(|i| {
            let daily = 2.0 * std::f64::consts::PI * i as f64 / 288.0;
            350.0 + 120.0 * daily.sin() + 25.0 * (i as f64 * 0.45).sin()
        })
        .collect();
    Series::new(timestamps, values).expect("synthetic series is well-formed")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let gate = Arc::new(ParameterGate::new());
    gate.submit(FamilyParams::General(GeneralParams::default()))?;
    gate.submit(FamilyParams::Fts(FtsParams {
        interval: 9,
        ..Default::default()
    }))?;
    gate.submit(FamilyParams::Ann(AnnParams::default()))?;
    gate.submit(FamilyParams::Arima(ArimaParams::default()))?;

    let orchestrator = Orchestrator::new(
        gate,
        Arc::new(SmoothingStub {
            name: "AnnStub",
            window: 6,
        }),
        Arc::new(SmoothingStub {
            name: "ArimaStub",
            window: 12,
        }),
    );

    let mut events = orchestrator.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                PipelineEvent::StageStarted { stage, .. } => println!("-> {stage}"),
                PipelineEvent::StageProgress {
                    stage,
                    percent,
                    message,
                    ..
                } => println!("   {stage} {percent:>3}% {message}"),
                PipelineEvent::StageFinished { stage, outcome, .. } => {
                    let verdict = if outcome.is_success() { "ok" } else { "failed" };
                    println!("<- {stage} ({verdict})");
                }
                PipelineEvent::RunCompleted { .. }
                | PipelineEvent::RunCancelled { .. }
                | PipelineEvent::RunFailed { .. } => break,
            }
        }
    });

    let handle = orchestrator.spawn(synthetic_power_series(576))?;
    let run = handle.wait().await?;
    let _ = printer.await;

    println!("\nrun {} finished: {:?}", run.id, run.status);
    println!("\n{:<14} {:<18} {:>10} {:>10} {:>9}", "stage", "model", "MAE", "RMSE", "MAPE");
    for line in run.summary() {
        let mape = line
            .mape
            .map(|m| format!("{m:.2}%"))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "{:<14} {:<18} {:>10.4} {:>10.4} {:>9}",
            line.stage.to_string(),
            line.model,
            line.mae,
            line.rmse,
            mape
        );
    }

    if let Some(sweep) = &run.sensitivity {
        println!("\nsensitivity scenarios (best first):");
        for case in &sweep.cases {
            let mape = case
                .mape
                .map(|m| format!("{m:.2}%"))
                .unwrap_or_else(|| "n/a".to_string());
            println!("  {:<8} {:<24} MAPE {}", case.id, case.label, mape);
        }
    }

    Ok(())
}
