//! Entry point a host uses to load the bundled scripts.

use crate::aggregation::{CategoryStats, Profit};
use crate::error::Result;
use crate::registry::ScriptRegistry;
use crate::script::ScriptFactory;
use crate::scripts::{IsPrimeFactory, ScoreFactorFactory, SplitTransformFactory};
use crate::settings::ScriptSettings;
use std::sync::Arc;

/// The plugin bundling every native script in this crate.
///
/// The host creates the plugin once with its node settings, asks it for the
/// settings it understands, and builds a [`ScriptRegistry`] from it.
///
/// # Examples
///
/// ```rust
/// use searus_scripts::prelude::*;
///
/// let plugin = NativeScriptPlugin::new(ScriptSettings::default());
/// let registry = plugin.registry().unwrap();
/// assert!(registry.contains("is_prime"));
/// assert!(registry.contains("profit"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeScriptPlugin {
  settings: ScriptSettings,
}

impl NativeScriptPlugin {
  pub fn new(settings: ScriptSettings) -> Self {
    Self { settings }
  }

  /// Names of the node settings registered by this plugin.
  pub fn settings(&self) -> &'static [&'static str] {
    ScriptSettings::registered()
  }

  /// The search and transform script factories.
  pub fn native_scripts(&self) -> Vec<Arc<dyn ScriptFactory>> {
    vec![
      Arc::new(IsPrimeFactory::new(&self.settings)),
      Arc::new(ScoreFactorFactory),
      Arc::new(SplitTransformFactory),
    ]
  }

  /// Registers every script and scripted metric into `registry`.
  pub fn register(&self, registry: &mut ScriptRegistry) -> Result<()> {
    for factory in self.native_scripts() {
      registry.register_script(factory)?;
    }
    registry.register_metric(CategoryStats)?;
    registry.register_metric(Profit)?;
    Ok(())
  }

  /// Builds a registry holding only this plugin's scripts.
  pub fn registry(&self) -> Result<ScriptRegistry> {
    let mut registry = ScriptRegistry::new();
    self.register(&mut registry)?;
    tracing::debug!(scripts = ?registry.list(), "loaded native script plugin");
    Ok(registry)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::PRIME_DEFAULT_FIELD_NAME;

  #[test]
  fn test_registers_everything() {
    let registry = NativeScriptPlugin::default().registry().unwrap();
    assert_eq!(
      registry.list(),
      vec!["category_stats", "is_prime", "profit", "score_factor", "split_transform"]
    );
  }

  #[test]
  fn test_registering_twice_fails() {
    let plugin = NativeScriptPlugin::default();
    let mut registry = plugin.registry().unwrap();
    assert!(plugin.register(&mut registry).is_err());
  }

  #[test]
  fn test_exposes_settings() {
    assert_eq!(
      NativeScriptPlugin::default().settings(),
      &[PRIME_DEFAULT_FIELD_NAME]
    );
  }
}
