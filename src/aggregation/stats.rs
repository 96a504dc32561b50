//! Running and summarised statistics for one aggregation bucket.

use serde::{Deserialize, Serialize};

fn merge_min(a: Option<f64>, b: Option<f64>) -> Option<f64> {
  match (a, b) {
    (Some(a), Some(b)) => Some(a.min(b)),
    (a, b) => a.or(b),
  }
}

fn merge_max(a: Option<f64>, b: Option<f64>) -> Option<f64> {
  match (a, b) {
    (Some(a), Some(b)) => Some(a.max(b)),
    (a, b) => a.or(b),
  }
}

/// Adds two finite values, clamping the result to the finite range.
///
/// Summaries travel as JSON, which has no representation for infinities.
pub fn saturating_add(a: f64, b: f64) -> f64 {
  (a + b).clamp(f64::MIN, f64::MAX)
}

/// Adds two finite values, or returns `None` when the sum leaves the finite range.
pub fn checked_add(a: f64, b: f64) -> Option<f64> {
  let sum = a + b;
  sum.is_finite().then_some(sum)
}

/// Mutable counters for one key of a shard accumulator.
///
/// The default value is the identity of [`RunningStats::merge`]: zero count,
/// zero sum, no extremes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
  pub count: u64,
  pub sum: f64,
  pub min: Option<f64>,
  pub max: Option<f64>,
}

impl RunningStats {
  /// Records one value. Extremes are only updated when `track_extremes` is set.
  ///
  /// Returns `false` and leaves the counters untouched when the value is not
  /// finite or would push the sum out of the finite range.
  pub fn record(&mut self, value: f64, track_extremes: bool) -> bool {
    if !value.is_finite() {
      return false;
    }
    let Some(sum) = checked_add(self.sum, value) else {
      return false;
    };
    self.count += 1;
    self.sum = sum;
    if track_extremes {
      self.min = merge_min(self.min, Some(value));
      self.max = merge_max(self.max, Some(value));
    }
    true
  }

  /// Folds another set of counters into this one.
  pub fn merge(&mut self, other: &RunningStats) {
    self.count += other.count;
    self.sum = saturating_add(self.sum, other.sum);
    self.min = merge_min(self.min, other.min);
    self.max = merge_max(self.max, other.max);
  }

  /// The mean of the recorded values, `0.0` when nothing was recorded.
  pub fn avg(&self) -> f64 {
    if self.count == 0 {
      0.0
    } else {
      self.sum / self.count as f64
    }
  }
}

/// The transferable statistics of one bucket.
///
/// Used both for shard summaries and for the final result. `avg` is always
/// derived from `sum` and `count`; merging never averages averages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
  pub count: u64,
  pub sum: f64,
  pub avg: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<f64>,
}

impl BucketStats {
  /// Merges another bucket into this one and recomputes the average.
  pub fn merge(&mut self, other: &BucketStats) {
    let mut running = RunningStats::from(*self);
    running.merge(&RunningStats::from(*other));
    *self = BucketStats::from(&running);
  }
}

impl From<&RunningStats> for BucketStats {
  fn from(stats: &RunningStats) -> Self {
    Self {
      count: stats.count,
      sum: stats.sum,
      avg: stats.avg(),
      min: stats.min,
      max: stats.max,
    }
  }
}

impl From<BucketStats> for RunningStats {
  fn from(stats: BucketStats) -> Self {
    Self {
      count: stats.count,
      sum: stats.sum,
      min: stats.min,
      max: stats.max,
    }
  }
}
