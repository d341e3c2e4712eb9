//! Baseline comparison forecasts.
//!
//! Cheap reference models the learned stages are compared against: the naive
//! no-change forecast and a trailing moving average. Both walk the test
//! window one step at a time using observed values only, matching the
//! alignment of the fuzzy time series engine.

use crate::core::Series;

/// Naive forecast: each position predicts the previous observed value.
///
/// The first position has nothing to condition on and is absent.
pub fn naive_forecast(train: &Series, test: &Series) -> Vec<Option<f64>> {
    if test.is_empty() {
        return Vec::new();
    }
    let mut prev = train.last_value().unwrap_or(test.values()[0]);
    let mut predictions = Vec::with_capacity(test.len());
    for (idx, value) in test.values().iter().enumerate() {
        if idx == 0 {
            predictions.push(None);
        } else {
            predictions.push(Some(prev));
        }
        prev = *value;
    }
    predictions
}

/// Moving-average forecast: mean of the trailing `window` observations.
///
/// History starts with the training series and consumes test observations as
/// the window slides forward. Positions without enough history are absent.
pub fn moving_average_forecast(train: &Series, test: &Series, window: usize) -> Vec<Option<f64>> {
    if test.is_empty() {
        return Vec::new();
    }
    let window = window.max(1);
    let mut history: Vec<f64> = train.values().to_vec();
    let mut predictions = Vec::with_capacity(test.len());
    for (idx, value) in test.values().iter().enumerate() {
        if idx == 0 || history.len() < window {
            predictions.push(None);
        } else {
            let tail = &history[history.len() - window..];
            predictions.push(Some(tail.iter().sum::<f64>() / window as f64));
        }
        history.push(*value);
    }
    predictions
}
