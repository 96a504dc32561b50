//! A search script that checks whether a numeric field holds a prime.

use crate::error::{Result, ScriptError};
use crate::params::ParamReader;
use crate::script::{NativeScript, ScriptFactory, SearchScript};
use crate::settings::ScriptSettings;
use crate::types::{ScriptHit, ScriptParams};
use serde_json::Value;

const DEFAULT_CERTAINTY: i64 = 10;

/// Creates [`IsPrimeScript`] instances.
///
/// Parameters:
///
/// * `field` - the field to check. Falls back to the
///   `my_scripts.prime.default_field_name` setting; one of the two is required.
/// * `certainty` (optional, default 10) - a value of zero or less accepts
///   every number without testing it.
#[derive(Debug, Clone, Default)]
pub struct IsPrimeFactory {
  default_field_name: Option<String>,
}

impl IsPrimeFactory {
  pub const NAME: &'static str = "is_prime";

  /// Creates the factory, reading the default field from node settings.
  pub fn new(settings: &ScriptSettings) -> Self {
    Self {
      default_field_name: settings.prime.default_field_name.clone(),
    }
  }
}

impl ScriptFactory for IsPrimeFactory {
  fn name(&self) -> &str {
    Self::NAME
  }

  fn new_script(&self, params: Option<&ScriptParams>) -> Result<NativeScript> {
    let reader = ParamReader::new(Self::NAME, params);
    let field = reader
      .string("field")?
      .or_else(|| self.default_field_name.clone())
      .filter(|f| !f.is_empty())
      .ok_or_else(|| ScriptError::missing_parameter(Self::NAME, "field"))?;
    let certainty = reader.i64_or("certainty", DEFAULT_CERTAINTY)?;

    Ok(NativeScript::Search(Box::new(IsPrimeScript { field, certainty })))
  }
}

/// Returns `true` when the configured field holds a prime number.
#[derive(Debug, Clone)]
pub struct IsPrimeScript {
  field: String,
  certainty: i64,
}

impl SearchScript for IsPrimeScript {
  fn run(&self, hit: ScriptHit<'_>) -> Result<Value> {
    let prime = match hit.doc.i64_value(&self.field) {
      Some(n) => self.certainty <= 0 || is_prime(n.unsigned_abs()),
      None => false,
    };
    Ok(Value::Bool(prime))
  }
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
  ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
  let mut result = 1;
  base %= m;
  while exp > 0 {
    if exp & 1 == 1 {
      result = mul_mod(result, base, m);
    }
    base = mul_mod(base, base, m);
    exp >>= 1;
  }
  result
}

/// Deterministic Miller-Rabin. These witnesses are exact for every `u64`.
pub fn is_prime(n: u64) -> bool {
  const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

  if n < 2 {
    return false;
  }
  for p in WITNESSES {
    if n % p == 0 {
      return n == p;
    }
  }

  let mut d = n - 1;
  let mut r = 0;
  while d % 2 == 0 {
    d /= 2;
    r += 1;
  }

  'witness: for a in WITNESSES {
    let mut x = pow_mod(a, d, n);
    if x == 1 || x == n - 1 {
      continue;
    }
    for _ in 1..r {
      x = mul_mod(x, x, n);
      if x == n - 1 {
        continue 'witness;
      }
    }
    return false;
  }
  true
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::Document;
  use serde_json::json;

  fn script(params: Value, settings: &ScriptSettings) -> Result<NativeScript> {
    let params: ScriptParams = serde_json::from_value(params).unwrap();
    IsPrimeFactory::new(settings).new_script(Some(&params))
  }

  #[test]
  fn test_is_prime() {
    let primes: Vec<u64> = (0..50).filter(|n| is_prime(*n)).collect();
    assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]);
    assert!(is_prime(18_446_744_073_709_551_557));
    assert!(!is_prime(3_215_031_751));
    assert!(!is_prime(u64::MAX));
  }

  #[test]
  fn test_missing_field_is_a_config_error() {
    let err = match script(json!({}), &ScriptSettings::default()) {
      Err(err) => err,
      Ok(_) => panic!("expected a missing parameter error"),
    };
    assert!(err.is_config_error());
  }

  #[test]
  fn test_settings_supply_default_field() {
    let settings = ScriptSettings::default().prime_default_field("number");
    let script = script(json!({}), &settings).unwrap();
    let doc = Document::new().with_field("number", 13);
    let value = script.as_search().unwrap().run(ScriptHit::new(&doc)).unwrap();
    assert_eq!(value, json!(true));
  }

  #[test]
  fn test_run_on_documents() {
    let script = script(json!({ "field": "n" }), &ScriptSettings::default()).unwrap();
    let search = script.as_search().unwrap();

    let check = |doc: Document| search.run(ScriptHit::new(&doc)).unwrap();
    assert_eq!(check(Document::new().with_field("n", 7)), json!(true));
    assert_eq!(check(Document::new().with_field("n", -7)), json!(true));
    assert_eq!(check(Document::new().with_field("n", 9)), json!(false));
    assert_eq!(check(Document::new().with_field("n", "seven")), json!(false));
    assert_eq!(check(Document::new()), json!(false));
  }

  #[test]
  fn test_non_positive_certainty_accepts_everything() {
    let script = script(json!({ "field": "n", "certainty": 0 }), &ScriptSettings::default()).unwrap();
    let doc = Document::new().with_field("n", 9);
    let value = script.as_search().unwrap().run(ScriptHit::new(&doc)).unwrap();
    assert_eq!(value, json!(true));
  }
}
