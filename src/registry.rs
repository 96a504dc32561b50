//! Name-keyed lookup of native scripts and scripted metrics.
//!
//! Scripts and aggregations share a single namespace: a name can only be
//! registered once, whatever kind of script it refers to.

use crate::aggregation::{MetricAdapter, MetricScript, ScriptedMetric};
use crate::error::{Result, ScriptError};
use crate::script::{NativeScript, ScriptFactory};
use crate::types::ScriptParams;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Validate a script name before registration.
///
/// Names cannot be empty and cannot contain whitespace.
fn validate_script_name(name: &str) -> Result<()> {
  if name.is_empty() {
    return Err(ScriptError::registration(name, "script name cannot be empty"));
  }
  if name.contains(char::is_whitespace) {
    return Err(ScriptError::registration(
      name,
      "script name cannot contain whitespace",
    ));
  }
  Ok(())
}

/// Registry of every script a host can call by name.
///
/// Built once while the plugin loads, then shared read-only (wrap it in an
/// `Arc` to hand it to several engines or threads).
///
/// # Examples
///
/// ```rust
/// use searus_scripts::prelude::*;
///
/// let mut registry = ScriptRegistry::new();
/// registry.register_metric(CategoryStats).unwrap();
/// assert!(registry.metric("category_stats").is_ok());
/// assert!(registry.register_metric(CategoryStats).is_err());
/// ```
#[derive(Default, Clone)]
pub struct ScriptRegistry {
  scripts: BTreeMap<String, Arc<dyn ScriptFactory>>,
  metrics: BTreeMap<String, Arc<dyn MetricScript>>,
}

impl ScriptRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  fn claim(&self, name: &str) -> Result<()> {
    let checked = validate_script_name(name).and_then(|_| {
      if self.contains(name) {
        Err(ScriptError::registration(name, "name is already registered"))
      } else {
        Ok(())
      }
    });
    if let Err(err) = &checked {
      tracing::warn!(script = name, error = %err, "rejected script registration");
    }
    checked
  }

  /// Registers a search or transform script factory.
  pub fn register_script(&mut self, factory: Arc<dyn ScriptFactory>) -> Result<()> {
    let name = factory.name().to_string();
    self.claim(&name)?;
    tracing::debug!(script = %name, needs_scores = factory.needs_scores(), "registered native script");
    self.scripts.insert(name, factory);
    Ok(())
  }

  /// Registers a type-erased scripted metric.
  pub fn register_metric_script(&mut self, metric: Arc<dyn MetricScript>) -> Result<()> {
    let name = metric.name().to_string();
    self.claim(&name)?;
    tracing::debug!(script = %name, "registered scripted metric");
    self.metrics.insert(name, metric);
    Ok(())
  }

  /// Registers a typed scripted metric.
  pub fn register_metric<M>(&mut self, metric: M) -> Result<()>
  where
    M: ScriptedMetric + 'static,
    M::Summary: Serialize + DeserializeOwned,
    M::Final: Serialize,
  {
    self.register_metric_script(Arc::new(MetricAdapter(metric)))
  }

  /// Looks up a script factory by name.
  pub fn script(&self, name: &str) -> Result<Arc<dyn ScriptFactory>> {
    self
      .scripts
      .get(name)
      .cloned()
      .ok_or_else(|| ScriptError::UnknownScript(name.to_string()))
  }

  /// Creates a script instance from its registered factory.
  pub fn new_script(&self, name: &str, params: Option<&ScriptParams>) -> Result<NativeScript> {
    self.script(name)?.new_script(params)
  }

  /// Looks up a scripted metric by name.
  pub fn metric(&self, name: &str) -> Result<Arc<dyn MetricScript>> {
    self
      .metrics
      .get(name)
      .cloned()
      .ok_or_else(|| ScriptError::UnknownScript(name.to_string()))
  }

  /// Returns `true` if any script or metric uses `name`.
  pub fn contains(&self, name: &str) -> bool {
    self.scripts.contains_key(name) || self.metrics.contains_key(name)
  }

  /// Lists every registered name in sorted order.
  pub fn list(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .scripts
      .keys()
      .chain(self.metrics.keys())
      .cloned()
      .collect();
    names.sort();
    names
  }
}
