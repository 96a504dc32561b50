//! Scripted metric aggregations.
//!
//! A scripted metric runs in four phases. On every shard the host calls
//! `init` once, `map` once per matching document and `combine` once after the
//! last document. The coordinating node then calls `reduce` once with the
//! summaries of every shard.
//!
//! ```text
//!   shard 0:  init -> map* -> combine --\
//!   shard 1:  init -> map* -> combine ---+--> reduce -> final result
//!   shard n:  init -> map* -> combine --/
//! ```
//!
//! Implementations describe the phases with the typed [`ScriptedMetric`]
//! trait. [`MetricAdapter`] turns any such implementation into a
//! [`MetricScript`], the object safe form stored in a registry, where shard
//! summaries travel as JSON values.

use crate::error::Result;
use crate::types::{DocLookup, ScriptParams};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

pub mod category_stats;
pub mod profit;
pub mod stats;

pub use category_stats::{CategoryBuckets, CategoryStats, CategoryStatsConfig};
pub use profit::{Profit, ProfitConfig};
pub use stats::{BucketStats, RunningStats};

/// What a `map` call did with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
  /// The document contributed to the accumulator.
  Folded,
  /// The document lacked a usable value and was ignored.
  Skipped,
}

/// The phases a scripted metric moves through.
///
/// A shard execution only ever moves forward: `Init -> Mapping -> Combined`.
/// `Reduced` is reached once, on the coordinating node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AggregationPhase {
  Init,
  Mapping,
  Combined,
  Reduced,
}

impl fmt::Display for AggregationPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Init => "init",
      Self::Mapping => "mapping",
      Self::Combined => "combined",
      Self::Reduced => "reduced",
    };
    f.write_str(name)
  }
}

/// The four phase contract of a scripted metric aggregation.
///
/// `map` and `combine` must be associative and commutative folds so that the
/// final result does not depend on document order or on how documents are
/// spread over shards.
///
/// # Examples
///
/// Counting documents:
///
/// ```rust
/// use searus_scripts::prelude::*;
///
/// struct DocCount;
///
/// impl ScriptedMetric for DocCount {
///   type Config = ();
///   type Accumulator = u64;
///   type Summary = u64;
///   type Final = u64;
///
///   fn name(&self) -> &str { "doc_count" }
///   fn config(&self, _params: Option<&ScriptParams>) -> Result<()> { Ok(()) }
///   fn init(&self, _config: &()) -> u64 { 0 }
///   fn map(&self, _config: &(), acc: &mut u64, _doc: &dyn DocLookup) -> MapOutcome {
///     *acc += 1;
///     MapOutcome::Folded
///   }
///   fn combine(&self, _config: &(), acc: &u64) -> u64 { *acc }
///   fn reduce(&self, summaries: Vec<u64>) -> u64 { summaries.into_iter().sum() }
/// }
/// ```
pub trait ScriptedMetric: Send + Sync {
  /// Validated parameters, built once per request.
  type Config: Send + Sync;
  /// Shard-local mutable state.
  type Accumulator;
  /// The transferable result of one shard.
  type Summary;
  /// The result returned to the caller.
  type Final;

  /// The name the aggregation is registered under.
  fn name(&self) -> &str;

  /// Converts the host's parameter map into a typed configuration.
  ///
  /// # Errors
  ///
  /// Fails when a required parameter is missing or invalid. The aggregation
  /// request is rejected before any shard starts.
  fn config(&self, params: Option<&ScriptParams>) -> Result<Self::Config>;

  /// Creates an empty accumulator for one shard.
  fn init(&self, config: &Self::Config) -> Self::Accumulator;

  /// Folds one document into the accumulator.
  ///
  /// Documents with missing or malformed fields are skipped, never rejected.
  fn map(
    &self,
    config: &Self::Config,
    acc: &mut Self::Accumulator,
    doc: &dyn DocLookup,
  ) -> MapOutcome;

  /// Summarises a finished accumulator.
  fn combine(&self, config: &Self::Config, acc: &Self::Accumulator) -> Self::Summary;

  /// Merges the summaries of every shard. Summary order is not significant.
  fn reduce(&self, summaries: Vec<Self::Summary>) -> Self::Final;
}

/// Per-shard document counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShardStats {
  /// Documents handed to `map`.
  pub documents: usize,
  /// Documents `map` ignored.
  pub skipped: usize,
}

/// One shard's pass through `init -> map* -> combine`.
///
/// The accumulator is owned by the execution and only reachable through
/// `&mut self`, so map calls are sequential by construction. `combine`
/// consumes the execution, which makes further map calls impossible.
pub struct ShardExecution<'a, M: ScriptedMetric> {
  metric: &'a M,
  config: &'a M::Config,
  accumulator: M::Accumulator,
  phase: AggregationPhase,
  stats: ShardStats,
}

impl<'a, M: ScriptedMetric> ShardExecution<'a, M> {
  /// Runs `init` and returns an execution ready to map documents.
  pub fn init(metric: &'a M, config: &'a M::Config) -> Self {
    Self {
      metric,
      config,
      accumulator: metric.init(config),
      phase: AggregationPhase::Init,
      stats: ShardStats::default(),
    }
  }

  /// Folds one document into the shard accumulator.
  pub fn map(&mut self, doc: &dyn DocLookup) -> MapOutcome {
    self.phase = AggregationPhase::Mapping;
    self.stats.documents += 1;
    let outcome = self.metric.map(self.config, &mut self.accumulator, doc);
    if outcome == MapOutcome::Skipped {
      self.stats.skipped += 1;
      tracing::trace!(
        metric = self.metric.name(),
        document = self.stats.documents,
        "skipped document without usable fields"
      );
    }
    outcome
  }

  /// The current phase, `Init` until the first document arrives.
  pub fn phase(&self) -> AggregationPhase {
    self.phase
  }

  pub fn accumulator(&self) -> &M::Accumulator {
    &self.accumulator
  }

  pub fn stats(&self) -> ShardStats {
    self.stats
  }

  /// Closes the shard and produces its summary.
  pub fn combine(self) -> M::Summary {
    tracing::debug!(
      metric = self.metric.name(),
      from = %self.phase,
      documents = self.stats.documents,
      skipped = self.stats.skipped,
      "combining shard"
    );
    self.metric.combine(self.config, &self.accumulator)
  }
}

/// Object safe shard execution, as driven through a registry.
pub trait ShardCollector {
  /// Folds one document into the shard accumulator.
  fn collect(&mut self, doc: &dyn DocLookup) -> MapOutcome;

  /// Counters for the documents seen so far.
  fn stats(&self) -> ShardStats;

  /// Closes the shard and serializes its summary.
  fn combine(self: Box<Self>) -> Result<Value>;
}

impl<M> ShardCollector for ShardExecution<'_, M>
where
  M: ScriptedMetric,
  M::Summary: Serialize,
{
  fn collect(&mut self, doc: &dyn DocLookup) -> MapOutcome {
    self.map(doc)
  }

  fn stats(&self) -> ShardStats {
    ShardExecution::stats(self)
  }

  fn combine(self: Box<Self>) -> Result<Value> {
    let summary = ShardExecution::combine(*self);
    Ok(serde_json::to_value(summary)?)
  }
}

/// A scripted metric whose parameters have been validated.
pub trait PreparedMetric: Send + Sync {
  /// Runs `init` for a new shard.
  fn start_shard(&self) -> Box<dyn ShardCollector + '_>;

  /// Merges serialized shard summaries into the serialized final result.
  ///
  /// # Errors
  ///
  /// Fails if a summary does not deserialize as this metric's summary type.
  fn reduce(&self, summaries: Vec<Value>) -> Result<Value>;
}

/// Object safe form of a scripted metric, keyed by name in a registry.
pub trait MetricScript: Send + Sync {
  /// The name the aggregation is registered under.
  fn name(&self) -> &str;

  /// Validates the parameters of one aggregation request.
  fn prepare(&self, params: Option<&ScriptParams>) -> Result<Box<dyn PreparedMetric + '_>>;
}

/// Wraps a [`ScriptedMetric`] so it can be stored as a [`MetricScript`].
pub struct MetricAdapter<M>(pub M);

struct Prepared<'a, M: ScriptedMetric> {
  metric: &'a M,
  config: M::Config,
}

impl<M> PreparedMetric for Prepared<'_, M>
where
  M: ScriptedMetric,
  M::Summary: Serialize + DeserializeOwned,
  M::Final: Serialize,
{
  fn start_shard(&self) -> Box<dyn ShardCollector + '_> {
    Box::new(ShardExecution::init(self.metric, &self.config))
  }

  fn reduce(&self, summaries: Vec<Value>) -> Result<Value> {
    let summaries = summaries
      .into_iter()
      .map(serde_json::from_value::<M::Summary>)
      .collect::<std::result::Result<Vec<_>, _>>()?;
    tracing::debug!(
      metric = self.metric.name(),
      shards = summaries.len(),
      phase = %AggregationPhase::Reduced,
      "reducing shard summaries"
    );
    Ok(serde_json::to_value(self.metric.reduce(summaries))?)
  }
}

impl<M> MetricScript for MetricAdapter<M>
where
  M: ScriptedMetric,
  M::Summary: Serialize + DeserializeOwned,
  M::Final: Serialize,
{
  fn name(&self) -> &str {
    self.0.name()
  }

  fn prepare(&self, params: Option<&ScriptParams>) -> Result<Box<dyn PreparedMetric + '_>> {
    let config = self.0.config(params)?;
    Ok(Box::new(Prepared {
      metric: &self.0,
      config,
    }))
  }
}
