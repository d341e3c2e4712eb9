//! Per-family parameter records and their validation rules.
//!
//! Each model family carries its own typed record; a record only becomes
//! usable by the pipeline after the readiness gate has validated and locked
//! it. Integer fields are signed so an out-of-range submission (an ARIMA
//! order of -1, say) is representable and rejected with a specific message.

use crate::error::{AnalysisError, Result};
use crate::fts::{FtsConfig, PartitionMethod};
use crate::preprocess::ResampleMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four configurable model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    General,
    Fts,
    Ann,
    Arima,
}

impl Family {
    pub const ALL: [Family; 4] = [Family::General, Family::Fts, Family::Ann, Family::Arima];

    pub fn name(&self) -> &'static str {
        match self {
            Family::General => "general",
            Family::Fts => "fts",
            Family::Ann => "ann",
            Family::Arima => "arima",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options shared by every stage: target selection, split, and resampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralParams {
    /// Name of the measured quantity being forecast.
    pub target_variable: String,
    /// Fraction of the prepared series used for training.
    pub split_ratio: f64,
    /// Number of future periods the run is asked to cover.
    pub forecast_horizon: i64,
    pub resample_method: ResampleMethod,
}

impl Default for GeneralParams {
    fn default() -> Self {
        Self {
            target_variable: "watt".to_string(),
            split_ratio: 0.8,
            forecast_horizon: 1,
            resample_method: ResampleMethod::Mean,
        }
    }
}

impl GeneralParams {
    pub fn validate(&self) -> Result<()> {
        if self.target_variable.trim().is_empty() {
            return Err(AnalysisError::InvalidParameter(
                "general: target_variable must not be empty".to_string(),
            ));
        }
        if !self.split_ratio.is_finite() || self.split_ratio <= 0.0 || self.split_ratio >= 1.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "general: split_ratio must be strictly between 0 and 1, got {}",
                self.split_ratio
            )));
        }
        if self.forecast_horizon < 1 {
            return Err(AnalysisError::InvalidParameter(format!(
                "general: forecast_horizon must be at least 1, got {}",
                self.forecast_horizon
            )));
        }
        Ok(())
    }
}

/// Fuzzy time series options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtsParams {
    /// Number of universe intervals.
    pub interval: i64,
    /// Blend factor between naive and defuzzified forecasts.
    pub sensitivity: f64,
    pub partition_method: PartitionMethod,
    /// Fraction of the observed span padded onto the universe.
    pub pad_fraction: f64,
}

impl Default for FtsParams {
    fn default() -> Self {
        Self {
            interval: 7,
            sensitivity: 1.0,
            partition_method: PartitionMethod::EqualWidth,
            pad_fraction: 0.05,
        }
    }
}

impl FtsParams {
    pub fn validate(&self) -> Result<()> {
        if self.interval < 2 {
            return Err(AnalysisError::InvalidParameter(format!(
                "fts: interval must be at least 2, got {}",
                self.interval
            )));
        }
        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "fts: sensitivity must be a non-negative number, got {}",
                self.sensitivity
            )));
        }
        if !self.pad_fraction.is_finite() || self.pad_fraction < 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "fts: pad_fraction must be a non-negative number, got {}",
                self.pad_fraction
            )));
        }
        Ok(())
    }

    /// Convert a validated record into an engine configuration.
    pub fn to_config(&self) -> FtsConfig {
        FtsConfig {
            n_intervals: self.interval as usize,
            method: self.partition_method,
            pad_fraction: self.pad_fraction,
            sensitivity: self.sensitivity,
        }
    }
}

/// Neural network collaborator hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnParams {
    pub epoch: i64,
    pub neuron: i64,
    pub layers: i64,
    pub lr: f64,
}

impl Default for AnnParams {
    fn default() -> Self {
        Self {
            epoch: 200,
            neuron: 10,
            layers: 1,
            lr: 0.01,
        }
    }
}

impl AnnParams {
    pub fn validate(&self) -> Result<()> {
        if self.epoch < 1 {
            return Err(AnalysisError::InvalidParameter(format!(
                "ann: epoch must be at least 1, got {}",
                self.epoch
            )));
        }
        if self.neuron < 1 {
            return Err(AnalysisError::InvalidParameter(format!(
                "ann: neuron must be at least 1, got {}",
                self.neuron
            )));
        }
        if self.layers < 1 {
            return Err(AnalysisError::InvalidParameter(format!(
                "ann: layers must be at least 1, got {}",
                self.layers
            )));
        }
        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "ann: lr must be a positive number, got {}",
                self.lr
            )));
        }
        Ok(())
    }
}

/// ARIMA collaborator orders, with an optional seasonal component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaParams {
    pub p: i64,
    pub d: i64,
    pub q: i64,
    pub seasonal: bool,
    pub seasonal_p: i64,
    pub seasonal_d: i64,
    pub seasonal_q: i64,
    /// Season length, only meaningful when `seasonal` is set.
    pub seasonal_period: i64,
}

impl Default for ArimaParams {
    fn default() -> Self {
        Self {
            p: 1,
            d: 1,
            q: 1,
            seasonal: false,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
            seasonal_period: 12,
        }
    }
}

impl ArimaParams {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("p", self.p), ("d", self.d), ("q", self.q)] {
            if value < 0 {
                return Err(AnalysisError::InvalidParameter(format!(
                    "arima: {name} must be a non-negative integer, got {value}"
                )));
            }
        }
        if self.seasonal {
            for (name, value) in [
                ("P", self.seasonal_p),
                ("D", self.seasonal_d),
                ("Q", self.seasonal_q),
            ] {
                if value < 0 {
                    return Err(AnalysisError::InvalidParameter(format!(
                        "arima: seasonal {name} must be a non-negative integer, got {value}"
                    )));
                }
            }
            if self.seasonal_period < 1 {
                return Err(AnalysisError::InvalidParameter(format!(
                    "arima: seasonal period s must be at least 1, got {}",
                    self.seasonal_period
                )));
            }
        }
        Ok(())
    }
}

/// A submission for one family, as accepted by the readiness gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FamilyParams {
    General(GeneralParams),
    Fts(FtsParams),
    Ann(AnnParams),
    Arima(ArimaParams),
}

impl FamilyParams {
    pub fn family(&self) -> Family {
        match self {
            FamilyParams::General(_) => Family::General,
            FamilyParams::Fts(_) => Family::Fts,
            FamilyParams::Ann(_) => Family::Ann,
            FamilyParams::Arima(_) => Family::Arima,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FamilyParams::General(p) => p.validate(),
            FamilyParams::Fts(p) => p.validate(),
            FamilyParams::Ann(p) => p.validate(),
            FamilyParams::Arima(p) => p.validate(),
        }
    }
}

/// The validated, locked parameter set a pipeline run executes against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSnapshot {
    pub general: GeneralParams,
    pub fts: FtsParams,
    pub ann: AnnParams,
    pub arima: ArimaParams,
}
