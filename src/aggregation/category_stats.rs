//! Per-category sum, count, average and extremes.

use super::stats::{BucketStats, RunningStats};
use super::{MapOutcome, ScriptedMetric};
use crate::error::Result;
use crate::params::ParamReader;
use crate::types::{DocLookup, ScriptParams};
use serde_json::Value;
use std::collections::BTreeMap;

/// Statistics per key, used for accumulators, summaries and final results.
pub type CategoryBuckets<S> = BTreeMap<String, S>;

/// Validated parameters of [`CategoryStats`].
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatsConfig {
  /// Field holding the bucket key.
  pub key_field: String,
  /// Field holding the numeric value.
  pub value_field: String,
  /// Whether `min` and `max` are tracked.
  pub track_extremes: bool,
}

impl CategoryStatsConfig {
  pub fn new(key_field: impl Into<String>, value_field: impl Into<String>) -> Self {
    Self {
      key_field: key_field.into(),
      value_field: value_field.into(),
      track_extremes: true,
    }
  }

  pub fn track_extremes(mut self, track: bool) -> Self {
    self.track_extremes = track;
    self
  }
}

/// Groups documents by a key field and computes statistics over a value field.
///
/// Parameters:
///
/// * `key_field` (required) - the field to group by.
/// * `value_field` (required) - the numeric field to aggregate.
/// * `track_extremes` (optional, default `true`) - also track `min`/`max`.
///
/// String keys are used as is; numeric and boolean keys are rendered as
/// text. Documents without a key or without a numeric value are skipped, as
/// are values that would push a bucket's sum past the finite `f64` range.
/// Sums merged in `reduce` saturate at `f64::MAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryStats;

impl CategoryStats {
  pub const NAME: &'static str = "category_stats";

  fn bucket_key(value: &Value) -> Option<String> {
    match value {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }
}

impl ScriptedMetric for CategoryStats {
  type Config = CategoryStatsConfig;
  type Accumulator = CategoryBuckets<RunningStats>;
  type Summary = CategoryBuckets<BucketStats>;
  type Final = CategoryBuckets<BucketStats>;

  fn name(&self) -> &str {
    Self::NAME
  }

  fn config(&self, params: Option<&ScriptParams>) -> Result<CategoryStatsConfig> {
    let reader = ParamReader::new(Self::NAME, params);
    Ok(CategoryStatsConfig {
      key_field: reader.required_string("key_field")?,
      value_field: reader.required_string("value_field")?,
      track_extremes: reader.bool_or("track_extremes", true)?,
    })
  }

  fn init(&self, _config: &CategoryStatsConfig) -> Self::Accumulator {
    BTreeMap::new()
  }

  fn map(
    &self,
    config: &CategoryStatsConfig,
    acc: &mut Self::Accumulator,
    doc: &dyn DocLookup,
  ) -> MapOutcome {
    let Some(key) = doc.first_value(&config.key_field).and_then(Self::bucket_key) else {
      return MapOutcome::Skipped;
    };
    let Some(value) = doc.f64_value(&config.value_field) else {
      return MapOutcome::Skipped;
    };

    let stats = acc.entry(key).or_default();
    if stats.record(value, config.track_extremes) {
      MapOutcome::Folded
    } else {
      tracing::trace!(value, "value would overflow the bucket sum");
      MapOutcome::Skipped
    }
  }

  fn combine(&self, _config: &CategoryStatsConfig, acc: &Self::Accumulator) -> Self::Summary {
    acc
      .iter()
      .map(|(key, stats)| (key.clone(), BucketStats::from(stats)))
      .collect()
  }

  fn reduce(&self, summaries: Vec<Self::Summary>) -> Self::Final {
    let mut merged: CategoryBuckets<BucketStats> = BTreeMap::new();
    for summary in summaries {
      for (key, stats) in summary {
        merged
          .entry(key)
          .and_modify(|existing| existing.merge(&stats))
          .or_insert(stats);
      }
    }
    merged
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::aggregation::ShardExecution;
  use crate::types::Document;
  use serde_json::json;

  fn doc(cat: &str, val: f64) -> Document {
    Document::new().with_field("cat", cat).with_field("val", val)
  }

  fn config() -> CategoryStatsConfig {
    CategoryStatsConfig::new("cat", "val")
  }

  #[test]
  fn test_config_requires_fields() {
    let params: ScriptParams = serde_json::from_value(json!({ "key_field": "cat" })).unwrap();
    let err = CategoryStats.config(Some(&params)).unwrap_err();
    assert!(err.to_string().contains("value_field"));
    assert!(CategoryStats.config(None).is_err());
  }

  #[test]
  fn test_config_reads_all_params() {
    let params: ScriptParams = serde_json::from_value(json!({
      "key_field": "cat",
      "value_field": "val",
      "track_extremes": false,
    }))
    .unwrap();
    let config = CategoryStats.config(Some(&params)).unwrap();
    assert_eq!(config, CategoryStatsConfig::new("cat", "val").track_extremes(false));
  }

  #[test]
  fn test_map_skips_incomplete_documents() {
    let config = config();
    let mut shard = ShardExecution::init(&CategoryStats, &config);
    shard.map(&doc("A", 1.0));
    assert_eq!(shard.map(&Document::new().with_field("cat", "A")), MapOutcome::Skipped);
    assert_eq!(shard.map(&Document::new().with_field("val", 3.0)), MapOutcome::Skipped);
    assert_eq!(
      shard.map(&Document::new().with_field("cat", "A").with_field("val", "3")),
      MapOutcome::Skipped
    );

    assert_eq!(shard.accumulator()["A"].count, 1);
    assert_eq!(shard.stats().skipped, 3);
  }

  #[test]
  fn test_numeric_keys_are_rendered() {
    let config = config();
    let mut acc = CategoryStats.init(&config);
    let d = Document::new().with_field("cat", 7).with_field("val", 1.0);
    CategoryStats.map(&config, &mut acc, &d);
    assert!(acc.contains_key("7"));
  }

  #[test]
  fn test_combine_leaves_accumulator_untouched() {
    let config = config();
    let mut acc = CategoryStats.init(&config);
    CategoryStats.map(&config, &mut acc, &doc("A", 10.0));
    CategoryStats.map(&config, &mut acc, &doc("A", 20.0));
    let before = acc.clone();

    let summary = CategoryStats.combine(&config, &acc);
    assert_eq!(acc, before);
    assert_eq!(summary["A"].avg, 15.0);
    assert_eq!(summary["A"].min, Some(10.0));
    assert_eq!(summary["A"].max, Some(20.0));
  }

  #[test]
  fn test_reduce_treats_missing_keys_as_zero() {
    let config = config();
    let mut left = CategoryStats.init(&config);
    CategoryStats.map(&config, &mut left, &doc("A", 10.0));
    let mut right = CategoryStats.init(&config);
    CategoryStats.map(&config, &mut right, &doc("B", 5.0));
    CategoryStats.map(&config, &mut right, &doc("A", 20.0));

    let result = CategoryStats.reduce(vec![
      CategoryStats.combine(&config, &left),
      CategoryStats.combine(&config, &right),
    ]);

    assert_eq!(result.len(), 2);
    assert_eq!(result["A"].count, 2);
    assert_eq!(result["A"].sum, 30.0);
    assert_eq!(result["A"].avg, 15.0);
    assert_eq!(result["B"].count, 1);
    assert_eq!(result["B"].avg, 5.0);
  }

  #[test]
  fn test_reduce_of_nothing_is_empty() {
    assert!(CategoryStats.reduce(Vec::new()).is_empty());
  }
}
