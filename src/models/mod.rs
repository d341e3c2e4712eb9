//! Forecasting models outside the fuzzy time series engine: baseline
//! predictors and the external collaborator seam.

mod baseline;
mod external;

pub use baseline::{moving_average_forecast, naive_forecast};
pub use external::{ExternalModel, ExternalOutput};
