//! The aggregation engine that drives scripted metrics across shards.

use crate::aggregation::{
  MetricScript, PreparedMetric, ScriptedMetric, ShardExecution, ShardStats,
};
use crate::error::Result;
use crate::plugin::NativeScriptPlugin;
use crate::registry::ScriptRegistry;
use crate::types::{DocLookup, ScriptParams};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The outcome of a scripted metric run over a set of shards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationReport {
  /// The serialized final result of the reduce phase.
  pub value: Value,
  /// Document counters, one entry per shard in input order.
  pub shards: Vec<ShardStats>,
}

impl AggregationReport {
  /// Total number of documents mapped across all shards.
  pub fn documents(&self) -> usize {
    self.shards.iter().map(|s| s.documents).sum()
  }

  /// Total number of documents skipped across all shards.
  pub fn skipped(&self) -> usize {
    self.shards.iter().map(|s| s.skipped).sum()
  }
}

/// Drives scripted metrics registered in a [`ScriptRegistry`].
///
/// The engine plays the part of the host: it validates the request
/// parameters once, runs `init -> map* -> combine` for every shard, waits for
/// all shard summaries and runs `reduce` once. With the `parallel` feature
/// the shards run concurrently on the rayon pool; each shard still owns its
/// accumulator, so no locking happens inside the aggregation.
///
/// Hosts that do their own fan-out can call [`AggregationEngine::collect_shard`]
/// on each shard and [`AggregationEngine::reduce`] on the coordinating node.
///
/// # Examples
///
/// ```rust
/// use searus_scripts::prelude::*;
/// use serde_json::json;
///
/// let engine = AggregationEngine::builder()
///   .with_plugin(NativeScriptPlugin::default())
///   .build()
///   .unwrap();
///
/// let params: ScriptParams = serde_json::from_value(json!({
///   "key_field": "cat",
///   "value_field": "val",
/// })).unwrap();
///
/// let shards = vec![
///   vec![
///     Document::new().with_field("cat", "A").with_field("val", 10),
///     Document::new().with_field("cat", "B").with_field("val", 5),
///   ],
///   vec![Document::new().with_field("cat", "A").with_field("val", 20)],
/// ];
///
/// let report = engine.aggregate("category_stats", Some(&params), &shards).unwrap();
/// assert_eq!(report.value["A"]["avg"], json!(15.0));
/// assert_eq!(report.documents(), 3);
/// ```
#[derive(Clone)]
pub struct AggregationEngine {
  registry: Arc<ScriptRegistry>,
}

impl AggregationEngine {
  /// Creates a new `AggregationEngineBuilder` to construct an engine.
  pub fn builder() -> AggregationEngineBuilder {
    AggregationEngineBuilder::new()
  }

  /// Creates an engine over an existing registry.
  pub fn new(registry: Arc<ScriptRegistry>) -> Self {
    Self { registry }
  }

  pub fn registry(&self) -> &ScriptRegistry {
    &self.registry
  }

  fn prepare<'m>(
    metric: &'m dyn MetricScript,
    params: Option<&ScriptParams>,
  ) -> Result<Box<dyn PreparedMetric + 'm>> {
    metric.prepare(params).inspect_err(|err| {
      tracing::debug!(metric = metric.name(), error = %err, "rejected aggregation request");
    })
  }

  /// Runs one shard: `init`, `map` for every document, then `combine`.
  ///
  /// Returns the serialized shard summary and the shard's counters.
  pub fn collect_shard<D: DocLookup>(
    &self,
    name: &str,
    params: Option<&ScriptParams>,
    docs: &[D],
  ) -> Result<(Value, ShardStats)> {
    let metric = self.registry.metric(name)?;
    let prepared = Self::prepare(metric.as_ref(), params)?;
    run_collector(prepared.as_ref(), docs)
  }

  /// Merges shard summaries on the coordinating node.
  ///
  /// An empty list of summaries yields the metric's empty result.
  pub fn reduce(
    &self,
    name: &str,
    params: Option<&ScriptParams>,
    summaries: Vec<Value>,
  ) -> Result<Value> {
    let metric = self.registry.metric(name)?;
    let prepared = Self::prepare(metric.as_ref(), params)?;
    prepared.reduce(summaries)
  }

  /// Runs a scripted metric over every shard and reduces the results.
  ///
  /// # Errors
  ///
  /// Fails before any shard runs if the metric is unknown or its parameters
  /// are invalid. Documents with unusable fields never cause an error.
  pub fn aggregate<D, S>(
    &self,
    name: &str,
    params: Option<&ScriptParams>,
    shards: &[S],
  ) -> Result<AggregationReport>
  where
    D: DocLookup + Sync,
    S: AsRef<[D]> + Sync,
  {
    let metric = self.registry.metric(name)?;
    let prepared = Self::prepare(metric.as_ref(), params)?;
    tracing::debug!(metric = name, shards = shards.len(), "starting scripted metric");

    #[cfg(feature = "parallel")]
    let outputs: Vec<Result<(Value, ShardStats)>> = shards
      .par_iter()
      .map(|shard| run_collector(prepared.as_ref(), shard.as_ref()))
      .collect();

    #[cfg(not(feature = "parallel"))]
    let outputs: Vec<Result<(Value, ShardStats)>> = shards
      .iter()
      .map(|shard| run_collector(prepared.as_ref(), shard.as_ref()))
      .collect();

    let (summaries, stats): (Vec<Value>, Vec<ShardStats>) = outputs
      .into_iter()
      .collect::<Result<Vec<_>>>()?
      .into_iter()
      .unzip();

    let value = prepared.reduce(summaries)?;
    Ok(AggregationReport {
      value,
      shards: stats,
    })
  }
}

fn run_collector<D: DocLookup>(
  prepared: &dyn PreparedMetric,
  docs: &[D],
) -> Result<(Value, ShardStats)> {
  let mut collector = prepared.start_shard();
  for doc in docs {
    collector.collect(doc);
  }
  let stats = collector.stats();
  Ok((collector.combine()?, stats))
}

/// Runs a typed scripted metric over one shard's documents.
pub fn run_shard<M, D>(metric: &M, config: &M::Config, docs: &[D]) -> M::Summary
where
  M: ScriptedMetric,
  D: DocLookup,
{
  let mut shard = ShardExecution::init(metric, config);
  for doc in docs {
    shard.map(doc);
  }
  shard.combine()
}

/// Runs a typed scripted metric over every shard and reduces the summaries.
///
/// Shards run concurrently when the `parallel` feature is enabled.
pub fn run_shards<M, D, S>(metric: &M, config: &M::Config, shards: &[S]) -> M::Final
where
  M: ScriptedMetric,
  M::Summary: Send,
  D: DocLookup + Sync,
  S: AsRef<[D]> + Sync,
{
  #[cfg(feature = "parallel")]
  let summaries: Vec<M::Summary> = shards
    .par_iter()
    .map(|shard| run_shard(metric, config, shard.as_ref()))
    .collect();

  #[cfg(not(feature = "parallel"))]
  let summaries: Vec<M::Summary> = shards
    .iter()
    .map(|shard| run_shard(metric, config, shard.as_ref()))
    .collect();

  metric.reduce(summaries)
}

/// A builder for creating `AggregationEngine` instances.
#[derive(Default)]
pub struct AggregationEngineBuilder {
  registry: Option<ScriptRegistry>,
  plugins: Vec<NativeScriptPlugin>,
  metrics: Vec<Arc<dyn MetricScript>>,
}

impl AggregationEngineBuilder {
  /// Creates a new, empty `AggregationEngineBuilder`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts from an existing registry instead of an empty one.
  pub fn registry(mut self, registry: ScriptRegistry) -> Self {
    self.registry = Some(registry);
    self
  }

  /// Registers every script of a plugin.
  pub fn with_plugin(mut self, plugin: NativeScriptPlugin) -> Self {
    self.plugins.push(plugin);
    self
  }

  /// Registers one additional scripted metric.
  pub fn with(mut self, metric: Arc<dyn MetricScript>) -> Self {
    self.metrics.push(metric);
    self
  }

  /// Builds the engine.
  ///
  /// # Errors
  ///
  /// Fails if two scripts claim the same name.
  pub fn build(self) -> Result<AggregationEngine> {
    let mut registry = self.registry.unwrap_or_default();
    for plugin in &self.plugins {
      plugin.register(&mut registry)?;
    }
    for metric in self.metrics {
      registry.register_metric_script(metric)?;
    }
    Ok(AggregationEngine::new(Arc::new(registry)))
  }
}
