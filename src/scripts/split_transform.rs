//! An index-time transform that splits a delimited string field into values.

use crate::error::Result;
use crate::params::ParamReader;
use crate::script::{NativeScript, ScriptFactory, TransformScript};
use crate::types::ScriptParams;
use serde_json::{Map, Value};
use unicode_segmentation::UnicodeSegmentation;

/// Creates [`SplitTransformScript`] instances.
///
/// Parameters: `field` (required) and `delimiter` (optional, default `","`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitTransformFactory;

impl SplitTransformFactory {
  pub const NAME: &'static str = "split_transform";
}

impl ScriptFactory for SplitTransformFactory {
  fn name(&self) -> &str {
    Self::NAME
  }

  fn new_script(&self, params: Option<&ScriptParams>) -> Result<NativeScript> {
    let reader = ParamReader::new(Self::NAME, params);
    let field = reader.required_string("field")?;
    let delimiter = reader.string_or("delimiter", ",")?;
    Ok(NativeScript::Transform(Box::new(SplitTransformScript::new(
      field, delimiter,
    ))))
  }
}

/// Replaces a string field with the list of its delimited parts.
///
/// The field is only rewritten when it holds a string that actually splits
/// into more than one part. An empty delimiter splits the string into
/// grapheme clusters.
#[derive(Debug, Clone)]
pub struct SplitTransformScript {
  field: String,
  delimiter: String,
}

impl SplitTransformScript {
  pub fn new(field: impl Into<String>, delimiter: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      delimiter: delimiter.into(),
    }
  }

  fn split<'s>(&self, text: &'s str) -> Vec<&'s str> {
    if self.delimiter.is_empty() {
      text.graphemes(true).collect()
    } else {
      text.split(self.delimiter.as_str()).collect()
    }
  }
}

impl TransformScript for SplitTransformScript {
  fn transform(&self, source: &mut Map<String, Value>) {
    let Some(Value::String(text)) = source.get(&self.field) else {
      return;
    };

    let parts = self.split(text);
    if parts.len() > 1 {
      let values = parts
        .into_iter()
        .map(|p| Value::String(p.to_string()))
        .collect();
      source.insert(self.field.clone(), Value::Array(values));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn source(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => unreachable!(),
    }
  }

  #[test]
  fn test_default_delimiter() {
    let mut doc = source(json!({ "str": "0,1,2", "num": 2 }));
    SplitTransformScript::new("str", ",").transform(&mut doc);
    assert_eq!(doc["str"], json!(["0", "1", "2"]));
    assert_eq!(doc["num"], json!(2));
  }

  #[test]
  fn test_single_value_is_untouched() {
    let mut doc = source(json!({ "str": "0" }));
    SplitTransformScript::new("str", ",").transform(&mut doc);
    assert_eq!(doc["str"], json!("0"));
  }

  #[test]
  fn test_missing_or_non_string_field_is_untouched() {
    let mut doc = source(json!({ "num": 5 }));
    let script = SplitTransformScript::new("num", ",");
    script.transform(&mut doc);
    assert_eq!(doc["num"], json!(5));

    let mut empty = Map::new();
    script.transform(&mut empty);
    assert!(empty.is_empty());
  }

  #[test]
  fn test_empty_delimiter_splits_graphemes() {
    let mut doc = source(json!({ "s": "ab\u{e9}" }));
    SplitTransformScript::new("s", "").transform(&mut doc);
    assert_eq!(doc["s"], json!(["a", "b", "\u{e9}"]));
  }

  #[test]
  fn test_factory_params() {
    let params: ScriptParams =
      serde_json::from_value(json!({ "field": "strdash", "delimiter": "-" })).unwrap();
    let script = SplitTransformFactory.new_script(Some(&params)).unwrap();
    let mut doc = source(json!({ "strdash": "0-1" }));
    script.as_transform().unwrap().transform(&mut doc);
    assert_eq!(doc["strdash"], json!(["0", "1"]));

    assert!(SplitTransformFactory.new_script(None).is_err());
  }
}
