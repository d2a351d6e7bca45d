//! Named metric series recorded across workflow runs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use orrery_services::{LifecycleError, Service, Shutdownable};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
  #[error("no data recorded for metric '{name}'")]
  NoData { name: String },

  #[error("metrics store lock poisoned")]
  Poisoned,
}

/// Reduction applied by [`MetricsAggregator::aggregate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Aggregation {
  Min,
  Max,
  #[default]
  Avg,
  Sum,
  Count,
}

impl FromStr for Aggregation {
  type Err = std::convert::Infallible;

  /// Case-insensitive; anything unrecognised averages.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.to_ascii_lowercase().as_str() {
      "min" => Aggregation::Min,
      "max" => Aggregation::Max,
      "sum" => Aggregation::Sum,
      "count" => Aggregation::Count,
      _ => Aggregation::Avg,
    })
  }
}

impl fmt::Display for Aggregation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Aggregation::Min => "min",
      Aggregation::Max => "max",
      Aggregation::Avg => "avg",
      Aggregation::Sum => "sum",
      Aggregation::Count => "count",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Series {
  count: u64,
  sum: f64,
  min: f64,
  max: f64,
}

impl Series {
  fn record(&mut self, value: f64) {
    if self.count == 0 {
      self.min = value;
      self.max = value;
    } else {
      self.min = self.min.min(value);
      self.max = self.max.max(value);
    }
    self.count += 1;
    self.sum += value;
  }

  fn aggregate(&self, aggregation: Aggregation) -> f64 {
    if self.count == 0 {
      return 0.0;
    }
    match aggregation {
      Aggregation::Min => self.min,
      Aggregation::Max => self.max,
      Aggregation::Sum => self.sum,
      Aggregation::Count => self.count as f64,
      Aggregation::Avg => self.sum / self.count as f64,
    }
  }
}

/// Owned store for metric series.
///
/// Registered as a service and handed to the `debug.metrics` step at
/// construction, so recorded values live as long as the application and are
/// summarised on shutdown.
#[derive(Debug, Default)]
pub struct MetricsAggregator {
  series: Mutex<HashMap<String, Series>>,
}

impl MetricsAggregator {
  pub fn new() -> Self {
    Self::default()
  }

  fn with_series<T>(
    &self,
    f: impl FnOnce(&mut HashMap<String, Series>) -> T,
  ) -> Result<T, MetricsError> {
    let mut series = self.series.lock().map_err(|_| MetricsError::Poisoned)?;
    Ok(f(&mut series))
  }

  pub fn record(&self, name: &str, value: f64) -> Result<(), MetricsError> {
    self.with_series(|series| series.entry(name.to_string()).or_default().record(value))
  }

  pub fn aggregate(&self, name: &str, aggregation: Aggregation) -> Result<f64, MetricsError> {
    self
      .with_series(|series| series.get(name).map(|s| s.aggregate(aggregation)))?
      .ok_or_else(|| MetricsError::NoData {
        name: name.to_string(),
      })
  }

  /// Forget a series. Returns whether it existed.
  pub fn reset(&self, name: &str) -> Result<bool, MetricsError> {
    self.with_series(|series| series.remove(name).is_some())
  }

  /// Names of all recorded series, sorted.
  pub fn names(&self) -> Result<Vec<String>, MetricsError> {
    self.with_series(|series| {
      let mut names: Vec<String> = series.keys().cloned().collect();
      names.sort();
      names
    })
  }
}

impl Service for MetricsAggregator {
  fn as_shutdownable(self: Arc<Self>) -> Option<Arc<dyn Shutdownable>> {
    Some(self)
  }
}

impl Shutdownable for MetricsAggregator {
  /// Log a summary of every series and clear the store.
  fn shutdown(&self) -> Result<(), LifecycleError> {
    self
      .with_series(|series| {
        let mut names: Vec<&String> = series.keys().collect();
        names.sort();
        for name in names {
          let s = &series[name];
          info!(
            metric = %name,
            count = s.count,
            min = s.min,
            max = s.max,
            avg = s.aggregate(Aggregation::Avg),
            "metric summary"
          );
        }
        series.clear();
      })
      .map_err(|err| LifecycleError::new(err.to_string()))
  }
}
