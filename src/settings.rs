//! Node-level settings consumed by the native scripts.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Fully qualified name of the setting holding the default field of `is_prime`.
pub const PRIME_DEFAULT_FIELD_NAME: &str = "my_scripts.prime.default_field_name";

/// Settings supplied once, when the plugin is loaded.
///
/// Every section is optional in the serialized form, so an empty JSON object
/// is a valid configuration.
///
/// # Examples
///
/// ```rust
/// use searus_scripts::prelude::*;
///
/// let settings = ScriptSettings::from_json(
///   r#"{ "prime": { "default_field_name": "number" } }"#,
/// ).unwrap();
/// assert_eq!(settings.prime.default_field_name.as_deref(), Some("number"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
  /// Settings for the `is_prime` script.
  pub prime: PrimeSettings,
}

/// Settings for the `is_prime` script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimeSettings {
  /// Field checked when a query does not name one.
  pub default_field_name: Option<String>,
}

impl ScriptSettings {
  /// Parses settings from a JSON document.
  pub fn from_json(json: &str) -> Result<Self> {
    Ok(serde_json::from_str(json)?)
  }

  /// Sets the default field of the `is_prime` script.
  pub fn prime_default_field(mut self, field: impl Into<String>) -> Self {
    self.prime.default_field_name = Some(field.into());
    self
  }

  /// Names of every setting this crate understands.
  pub fn registered() -> &'static [&'static str] {
    &[PRIME_DEFAULT_FIELD_NAME]
  }
}
