//! A script field that scales the query score of each hit.

use crate::error::{Result, ScriptError};
use crate::params::ParamReader;
use crate::script::{NativeScript, ScriptFactory, SearchScript};
use crate::types::{ScriptHit, ScriptParams};
use serde_json::Value;

/// Creates [`ScoreFactorScript`] instances.
///
/// Parameter: `factor` (optional, default `2.0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreFactorFactory;

impl ScoreFactorFactory {
  pub const NAME: &'static str = "score_factor";
  pub const DEFAULT_FACTOR: f64 = 2.0;
}

impl ScriptFactory for ScoreFactorFactory {
  fn name(&self) -> &str {
    Self::NAME
  }

  fn needs_scores(&self) -> bool {
    true
  }

  fn new_script(&self, params: Option<&ScriptParams>) -> Result<NativeScript> {
    let factor = ParamReader::new(Self::NAME, params).f64_or("factor", Self::DEFAULT_FACTOR)?;
    Ok(NativeScript::Search(Box::new(ScoreFactorScript { factor })))
  }
}

/// Returns the score of the hit multiplied by a constant factor.
#[derive(Debug, Clone, Copy)]
pub struct ScoreFactorScript {
  factor: f64,
}

impl SearchScript for ScoreFactorScript {
  fn run(&self, hit: ScriptHit<'_>) -> Result<Value> {
    let score = hit
      .score
      .ok_or_else(|| ScriptError::execution(ScoreFactorFactory::NAME, "Enable scoring"))?;
    Ok(Value::from(score as f64 * self.factor))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Document;
  use serde_json::json;

  #[test]
  fn test_scales_score() {
    let params: ScriptParams = serde_json::from_value(json!({ "factor": 4.0 })).unwrap();
    let script = ScoreFactorFactory.new_script(Some(&params)).unwrap();
    let doc = Document::new();
    let value = script
      .as_search()
      .unwrap()
      .run(ScriptHit::new(&doc).with_score(0.5))
      .unwrap();
    assert_eq!(value.as_f64(), Some(2.0));
  }

  #[test]
  fn test_default_factor() {
    let script = ScoreFactorFactory.new_script(None).unwrap();
    let doc = Document::new();
    let value = script
      .as_search()
      .unwrap()
      .run(ScriptHit::new(&doc).with_score(1.5))
      .unwrap();
    assert_eq!(value.as_f64(), Some(3.0));
    assert!(ScoreFactorFactory.needs_scores());
  }

  #[test]
  fn test_missing_score_fails() {
    let script = ScoreFactorFactory.new_script(None).unwrap();
    let doc = Document::new();
    let err = script.as_search().unwrap().run(ScriptHit::new(&doc)).unwrap_err();
    assert!(matches!(err, ScriptError::Execution { .. }));
  }
}
