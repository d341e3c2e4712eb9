//! # powercast
//!
//! Comparative time series forecasting for household electrical power draw.
//!
//! Several independent modeling techniques — naive and moving-average
//! baselines, a first-principles fuzzy time series engine (Chen 1996), and
//! external ANN/ARIMA collaborators — run over the same prepared series, and
//! their accuracy is reported side by side.
//!
//! The crate is organized around an analysis pipeline: a readiness gate
//! validates and locks per-family model parameters, an orchestrator runs the
//! stages in a fixed order on a background context with progress events and
//! cooperative cancellation, and every stage reuses the same metrics engine
//! for evaluation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use powercast::params::{
//!     AnnParams, ArimaParams, FamilyParams, FtsParams, GeneralParams, ParameterGate,
//! };
//! use powercast::pipeline::Orchestrator;
//! # use powercast::core::Series;
//! # use powercast::models::{ExternalModel, ExternalOutput};
//! # use powercast::pipeline::StageContext;
//! # use powercast::params::ParamSnapshot;
//! # struct Stub;
//! # impl ExternalModel for Stub {
//! #     fn name(&self) -> &'static str { "Stub" }
//! #     fn run(&self, _t: &Series, test: &Series, _p: &ParamSnapshot, _c: &StageContext)
//! #         -> powercast::Result<ExternalOutput> {
//! #         Ok(ExternalOutput { predictions: vec![f64::NAN; test.len()], diagnostics: Default::default() })
//! #     }
//! # }
//! # async fn demo(series: Series) -> powercast::Result<()> {
//! let gate = Arc::new(ParameterGate::new());
//! gate.submit(FamilyParams::General(GeneralParams::default()))?;
//! gate.submit(FamilyParams::Fts(FtsParams::default()))?;
//! gate.submit(FamilyParams::Ann(AnnParams::default()))?;
//! gate.submit(FamilyParams::Arima(ArimaParams::default()))?;
//!
//! let orchestrator = Orchestrator::new(gate, Arc::new(Stub), Arc::new(Stub));
//! let run = orchestrator.spawn(series)?.wait().await?;
//! for line in run.summary() {
//!     println!("{} {}: MAE {:.4}", line.stage, line.model, line.mae);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;
pub mod fts;
pub mod metrics;
pub mod models;
pub mod params;
pub mod pipeline;
pub mod preprocess;

pub use error::{AnalysisError, Result};

pub mod prelude {
    pub use crate::core::Series;
    pub use crate::error::{AnalysisError, Result};
    pub use crate::fts::{FtsChen, FtsConfig, PartitionMethod};
    pub use crate::metrics::{evaluate, Evaluation};
    pub use crate::models::{ExternalModel, ExternalOutput};
    pub use crate::params::{FamilyParams, ParamSnapshot, ParameterGate};
    pub use crate::pipeline::{Orchestrator, PipelineEvent, PipelineRun, RunStatus, Stage};
}
