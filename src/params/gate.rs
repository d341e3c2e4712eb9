//! Readiness gate guarding pipeline entry.
//!
//! Each model family sits in an `Unlocked`/`Locked` state. A submission is
//! validated and, on success, locked in place; unlocking discards the stored
//! record. The aggregate `all_ready` predicate is the sole precondition for
//! starting a pipeline run, and while a run holds the locked snapshot every
//! submit/unlock attempt is rejected so the run never observes a parameter
//! change mid-flight.

use crate::error::{AnalysisError, Result};
use crate::params::families::{
    AnnParams, ArimaParams, Family, FamilyParams, FtsParams, GeneralParams, ParamSnapshot,
};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct GateInner {
    general: Option<GeneralParams>,
    fts: Option<FtsParams>,
    ann: Option<AnnParams>,
    arima: Option<ArimaParams>,
    run_active: bool,
}

impl GateInner {
    fn is_locked(&self, family: Family) -> bool {
        match family {
            Family::General => self.general.is_some(),
            Family::Fts => self.fts.is_some(),
            Family::Ann => self.ann.is_some(),
            Family::Arima => self.arima.is_some(),
        }
    }

    fn first_unlocked(&self) -> Option<Family> {
        Family::ALL.into_iter().find(|f| !self.is_locked(*f))
    }
}

/// Per-family lock/unlock state machine, shared across contexts via `Arc`.
#[derive(Debug, Default)]
pub struct ParameterGate {
    inner: Mutex<GateInner>,
}

impl ParameterGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and lock a parameter record for its family.
    ///
    /// On a validation failure the family stays in its previous state and
    /// the specific violated constraint is returned. Rejected outright while
    /// a run is in flight.
    pub fn submit(&self, params: FamilyParams) -> Result<()> {
        let family = params.family();
        let mut inner = self.lock();
        if inner.run_active {
            return Err(AnalysisError::RunInFlight);
        }
        params.validate()?;
        match params {
            FamilyParams::General(p) => inner.general = Some(p),
            FamilyParams::Fts(p) => inner.fts = Some(p),
            FamilyParams::Ann(p) => inner.ann = Some(p),
            FamilyParams::Arima(p) => inner.arima = Some(p),
        }
        tracing::info!(family = %family, "parameters validated and locked");
        Ok(())
    }

    /// Discard a family's stored record and return it to `Unlocked`.
    ///
    /// Always permitted outside of a run; the caller resubmits a new record
    /// to lock again.
    pub fn unlock(&self, family: Family) -> Result<()> {
        let mut inner = self.lock();
        if inner.run_active {
            return Err(AnalysisError::RunInFlight);
        }
        match family {
            Family::General => inner.general = None,
            Family::Fts => inner.fts = None,
            Family::Ann => inner.ann = None,
            Family::Arima => inner.arima = None,
        }
        tracing::info!(family = %family, "parameters unlocked");
        Ok(())
    }

    /// Whether one family is currently locked.
    pub fn is_locked(&self, family: Family) -> bool {
        self.lock().is_locked(family)
    }

    /// True only when every family is locked.
    pub fn all_ready(&self) -> bool {
        self.lock().first_unlocked().is_none()
    }

    /// Claim the locked snapshot for a run, marking the gate in-flight.
    ///
    /// Fails fast when a run is already active or any family is unlocked.
    pub(crate) fn begin_run(&self) -> Result<ParamSnapshot> {
        let mut inner = self.lock();
        if inner.run_active {
            return Err(AnalysisError::RunInFlight);
        }
        if let Some(unlocked) = inner.first_unlocked() {
            return Err(AnalysisError::NotReady(unlocked.name().to_string()));
        }
        let snapshot = ParamSnapshot {
            general: inner.general.clone().unwrap_or_default(),
            fts: inner.fts.clone().unwrap_or_default(),
            ann: inner.ann.clone().unwrap_or_default(),
            arima: inner.arima.clone().unwrap_or_default(),
        };
        inner.run_active = true;
        Ok(snapshot)
    }

    /// Release the in-flight claim after a run finalizes.
    pub(crate) fn end_run(&self) {
        self.lock().run_active = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
