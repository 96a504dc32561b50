//! Lenient readers for script parameters.
//!
//! Hosts pass parameters as loosely typed JSON. These helpers coerce the
//! common shapes the way node values are usually coerced (numbers from
//! numeric strings, strings from scalars) and turn anything else into a
//! configuration error that names the offending parameter.

use crate::error::{Result, ScriptError};
use crate::types::ScriptParams;
use serde_json::Value;

/// Reads typed values out of a [`ScriptParams`] map on behalf of one script.
///
/// An absent map behaves like an empty one, so scripts can be created without
/// any parameters at all.
#[derive(Debug, Clone, Copy)]
pub struct ParamReader<'a> {
  script: &'a str,
  params: Option<&'a ScriptParams>,
}

impl<'a> ParamReader<'a> {
  /// Creates a reader for the named script.
  pub fn new(script: &'a str, params: Option<&'a ScriptParams>) -> Self {
    Self { script, params }
  }

  fn raw(&self, name: &str) -> Option<&'a Value> {
    self.params?.get(name).filter(|v| !v.is_null())
  }

  fn invalid(&self, name: &str, message: impl Into<String>) -> ScriptError {
    ScriptError::invalid_parameter(self.script, name, message)
  }

  /// Reads a string parameter. Numbers and booleans are rendered as text.
  pub fn string(&self, name: &str) -> Result<Option<String>> {
    match self.raw(name) {
      None => Ok(None),
      Some(Value::String(s)) => Ok(Some(s.clone())),
      Some(Value::Number(n)) => Ok(Some(n.to_string())),
      Some(Value::Bool(b)) => Ok(Some(b.to_string())),
      Some(other) => Err(self.invalid(name, format!("expected a string, got {}", other))),
    }
  }

  /// Reads a string parameter, falling back to `default` when absent.
  pub fn string_or(&self, name: &str, default: &str) -> Result<String> {
    Ok(self.string(name)?.unwrap_or_else(|| default.to_string()))
  }

  /// Reads a string parameter that must be present and non-empty.
  pub fn required_string(&self, name: &str) -> Result<String> {
    match self.string(name)? {
      Some(s) if !s.is_empty() => Ok(s),
      _ => Err(ScriptError::missing_parameter(self.script, name)),
    }
  }

  /// Reads a floating point parameter, falling back to `default` when absent.
  pub fn f64_or(&self, name: &str, default: f64) -> Result<f64> {
    match self.raw(name) {
      None => Ok(default),
      Some(Value::Number(n)) => n
        .as_f64()
        .ok_or_else(|| self.invalid(name, format!("{} is not representable as a double", n))),
      Some(Value::String(s)) => s
        .trim()
        .parse::<f64>()
        .map_err(|e| self.invalid(name, format!("'{}': {}", s, e))),
      Some(other) => Err(self.invalid(name, format!("expected a number, got {}", other))),
    }
  }

  /// Reads an integer parameter, falling back to `default` when absent.
  ///
  /// Floating point values are truncated towards zero.
  pub fn i64_or(&self, name: &str, default: i64) -> Result<i64> {
    match self.raw(name) {
      None => Ok(default),
      Some(Value::Number(n)) => match n.as_i64() {
        Some(i) => Ok(i),
        None => n
          .as_f64()
          .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
          .map(|f| f.trunc() as i64)
          .ok_or_else(|| self.invalid(name, format!("{} is out of range", n))),
      },
      Some(Value::String(s)) => s
        .trim()
        .parse::<i64>()
        .map_err(|e| self.invalid(name, format!("'{}': {}", s, e))),
      Some(other) => Err(self.invalid(name, format!("expected an integer, got {}", other))),
    }
  }

  /// Reads a boolean parameter, falling back to `default` when absent.
  ///
  /// `"false"`, `"0"`, `"off"` and `"no"` read as `false`; any other string is `true`.
  pub fn bool_or(&self, name: &str, default: bool) -> Result<bool> {
    match self.raw(name) {
      None => Ok(default),
      Some(Value::Bool(b)) => Ok(*b),
      Some(Value::Number(n)) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(true)),
      Some(Value::String(s)) => Ok(!matches!(s.as_str(), "false" | "0" | "off" | "no")),
      Some(other) => Err(self.invalid(name, format!("expected a boolean, got {}", other))),
    }
  }
}
