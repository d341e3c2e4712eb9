//! Seam for the opaque ANN and ARIMA stage collaborators.
//!
//! The orchestrator has no insight into their internals: each is invoked
//! once per run with the prepared split and the locked parameter snapshot,
//! and hands back a prediction sequence plus numeric diagnostics. A
//! collaborator is expected to poll `StageContext::checkpoint` at its own
//! long-running boundaries so cancellation stays cooperative.

use crate::core::Series;
use crate::error::Result;
use crate::params::ParamSnapshot;
use crate::pipeline::StageContext;
use std::collections::BTreeMap;

/// Predictions and diagnostics returned by a collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalOutput {
    /// Index-aligned predictions over the test window. Non-finite entries
    /// mark positions the model could not forecast (warm-up steps).
    pub predictions: Vec<f64>,
    /// Free-form numeric diagnostics (loss, AIC, epochs run, ...).
    pub diagnostics: BTreeMap<String, f64>,
}

/// An external forecasting stage (ANN or ARIMA collaborator).
pub trait ExternalModel: Send + Sync {
    /// Display name used in stage results and logs.
    fn name(&self) -> &'static str;

    /// Train on `train` and predict the `test` window.
    fn run(
        &self,
        train: &Series,
        test: &Series,
        params: &ParamSnapshot,
        ctx: &StageContext,
    ) -> Result<ExternalOutput>;
}
