//! Fuzzy time series forecasting: universe partitioning, fuzzification,
//! relationship learning, and the Chen-style forecast engine.

mod chen;
mod flrg;
mod partition;
mod sensitivity;

pub use chen::{FtsChen, FtsConfig, FtsDiagnostics, FtsForecast};
pub use flrg::{fuzzify, Flrg, LabelIndex, SupportEntry};
pub use partition::{Interval, Partition, PartitionMethod};
pub use sensitivity::{run_sensitivity_analysis, SensitivityCase, SensitivityReport};
