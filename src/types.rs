//! Core data types shared by native scripts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The dynamic parameter map a host passes to a script.
///
/// Scripts never read this map while running. Each script converts it once
/// into its own typed configuration and rejects missing or invalid keys at
/// that point.
pub type ScriptParams = HashMap<String, Value>;

/// A read-only view over the fields of one document.
///
/// Hosts supply this view for every document a script sees. Multi-valued
/// fields are represented as JSON arrays; the typed accessors read the first
/// value, which is what doc-value lookups return for a single-value read.
pub trait DocLookup {
  /// Returns the raw value stored under `name`, if any.
  fn field(&self, name: &str) -> Option<&Value>;

  /// Returns the first value of a field, unwrapping arrays.
  ///
  /// `null` and empty arrays count as missing.
  fn first_value(&self, name: &str) -> Option<&Value> {
    match self.field(name)? {
      Value::Null => None,
      Value::Array(values) => values.first().filter(|v| !v.is_null()),
      value => Some(value),
    }
  }

  /// Returns `true` if the field holds at least one non-null value.
  fn has_field(&self, name: &str) -> bool {
    self.first_value(name).is_some()
  }

  /// Reads a field as a string.
  fn str_value(&self, name: &str) -> Option<&str> {
    self.first_value(name)?.as_str()
  }

  /// Reads a numeric field as `f64`. Strings are not coerced.
  fn f64_value(&self, name: &str) -> Option<f64> {
    self.first_value(name)?.as_f64()
  }

  /// Reads a numeric field as `i64`.
  ///
  /// Floating point values are accepted when they carry no fractional part.
  fn i64_value(&self, name: &str) -> Option<i64> {
    let value = self.first_value(name)?;
    if let Some(n) = value.as_i64() {
      return Some(n);
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
      Some(f as i64)
    } else {
      None
    }
  }
}

impl DocLookup for Map<String, Value> {
  fn field(&self, name: &str) -> Option<&Value> {
    self.get(name)
  }
}

/// An owned document backed by a JSON object.
///
/// # Examples
///
/// ```rust
/// use searus_scripts::prelude::*;
///
/// let doc = Document::new()
///   .with_field("category", "books")
///   .with_field("price", 12.5);
///
/// assert_eq!(doc.str_value("category"), Some("books"));
/// assert_eq!(doc.f64_value("price"), Some(12.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
  fields: Map<String, Value>,
}

impl Document {
  /// Creates an empty document.
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a field to the document.
  pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
    self.fields.insert(name.into(), value.into());
    self
  }

  /// Builds a document from a JSON value. Returns `None` unless the value is an object.
  pub fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Object(fields) => Some(Self { fields }),
      _ => None,
    }
  }

  /// The fields of this document.
  pub fn fields(&self) -> &Map<String, Value> {
    &self.fields
  }

  /// Mutable access to the fields, used by index-time transforms.
  pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
    &mut self.fields
  }

  pub fn into_fields(self) -> Map<String, Value> {
    self.fields
  }
}

impl From<Map<String, Value>> for Document {
  fn from(fields: Map<String, Value>) -> Self {
    Self { fields }
  }
}

impl DocLookup for Document {
  fn field(&self, name: &str) -> Option<&Value> {
    self.fields.get(name)
  }
}

/// The per-document context handed to a search script.
///
/// `score` is only present when the host computed scores for the query.
#[derive(Clone, Copy)]
pub struct ScriptHit<'a> {
  /// The document being evaluated.
  pub doc: &'a dyn DocLookup,
  /// The query score of the document, if scoring is enabled.
  pub score: Option<f32>,
}

impl<'a> ScriptHit<'a> {
  /// Creates a hit for a document without a score.
  pub fn new(doc: &'a dyn DocLookup) -> Self {
    Self { doc, score: None }
  }

  /// Attaches the query score of the document.
  pub fn with_score(mut self, score: f32) -> Self {
    self.score = Some(score);
    self
  }
}
