//! Error types for native scripts and scripted aggregations.
//!
//! Only configuration and registration problems surface as errors. Bad data
//! on an individual document never does: scripts skip the document instead.

use thiserror::Error;

/// Result type alias using [`ScriptError`].
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors raised while building, registering, or running native scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
  /// A required script parameter was not supplied.
  #[error("[{script}]: Missing the {param} parameter")]
  MissingParameter { script: String, param: String },

  /// A script parameter was supplied but could not be used.
  #[error("[{script}]: Invalid value for the {param} parameter: {message}")]
  InvalidParameter {
    script: String,
    param: String,
    message: String,
  },

  /// No script or aggregation is registered under the requested name.
  #[error("No native script registered under '{0}'")]
  UnknownScript(String),

  /// The script could not be added to a registry.
  #[error("Cannot register '{name}': {message}")]
  Registration { name: String, message: String },

  /// The script failed while producing a value for a document.
  #[error("[{script}]: {message}")]
  Execution { script: String, message: String },

  /// A shard summary or final result could not cross the JSON boundary.
  #[error("Serialization error: {message}")]
  Serialization {
    message: String,
    #[source]
    source: Option<serde_json::Error>,
  },
}

impl ScriptError {
  pub fn missing_parameter(script: impl Into<String>, param: impl Into<String>) -> Self {
    Self::MissingParameter {
      script: script.into(),
      param: param.into(),
    }
  }

  pub fn invalid_parameter(
    script: impl Into<String>,
    param: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    Self::InvalidParameter {
      script: script.into(),
      param: param.into(),
      message: message.into(),
    }
  }

  pub fn registration(name: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Registration {
      name: name.into(),
      message: message.into(),
    }
  }

  pub fn execution(script: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Execution {
      script: script.into(),
      message: message.into(),
    }
  }

  /// Returns `true` for errors caused by script parameters.
  pub fn is_config_error(&self) -> bool {
    matches!(
      self,
      Self::MissingParameter { .. } | Self::InvalidParameter { .. }
    )
  }
}

impl From<serde_json::Error> for ScriptError {
  fn from(err: serde_json::Error) -> Self {
    Self::Serialization {
      message: err.to_string(),
      source: Some(err),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_missing_parameter_message() {
    let err = ScriptError::missing_parameter("split_transform", "field");
    assert_eq!(err.to_string(), "[split_transform]: Missing the field parameter");
    assert!(err.is_config_error());
  }

  #[test]
  fn test_serde_error_converts() {
    let err: ScriptError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, ScriptError::Serialization { source: Some(_), .. }));
    assert!(!err.is_config_error());
  }
}
