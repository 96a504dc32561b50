//! Profit over a stream of stock transactions.

use super::stats::{checked_add, saturating_add};
use super::{MapOutcome, ScriptedMetric};
use crate::error::Result;
use crate::params::ParamReader;
use crate::types::{DocLookup, ScriptParams};

/// Validated parameters of [`Profit`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitConfig {
  pub type_field: String,
  pub amount_field: String,
  /// Transaction type counted as income. Every other type is a cost.
  pub sale_type: String,
}

impl Default for ProfitConfig {
  fn default() -> Self {
    Self {
      type_field: "type".to_string(),
      amount_field: "amount".to_string(),
      sale_type: "sale".to_string(),
    }
  }
}

/// Computes the profit of a set of transactions.
///
/// Each shard keeps a running balance of signed transaction amounts (sales
/// positive, everything else negative), combines it into the shard's profit,
/// and the reduce phase adds the shard profits together.
///
/// A transaction that would push the balance past the finite `f64` range is
/// skipped; shard profits added in `reduce` saturate instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct Profit;

impl Profit {
  pub const NAME: &'static str = "profit";
}

impl ScriptedMetric for Profit {
  type Config = ProfitConfig;
  type Accumulator = f64;
  type Summary = f64;
  type Final = f64;

  fn name(&self) -> &str {
    Self::NAME
  }

  fn config(&self, params: Option<&ScriptParams>) -> Result<ProfitConfig> {
    let defaults = ProfitConfig::default();
    let reader = ParamReader::new(Self::NAME, params);
    Ok(ProfitConfig {
      type_field: reader.string_or("type_field", &defaults.type_field)?,
      amount_field: reader.string_or("amount_field", &defaults.amount_field)?,
      sale_type: reader.string_or("sale_type", &defaults.sale_type)?,
    })
  }

  fn init(&self, _config: &ProfitConfig) -> f64 {
    0.0
  }

  fn map(&self, config: &ProfitConfig, acc: &mut f64, doc: &dyn DocLookup) -> MapOutcome {
    let (Some(kind), Some(amount)) = (
      doc.str_value(&config.type_field),
      doc.f64_value(&config.amount_field),
    ) else {
      return MapOutcome::Skipped;
    };

    let signed = if kind == config.sale_type { amount } else { -amount };
    match checked_add(*acc, signed) {
      Some(balance) => {
        *acc = balance;
        MapOutcome::Folded
      }
      None => {
        tracing::trace!(amount, "transaction would overflow the balance");
        MapOutcome::Skipped
      }
    }
  }

  fn combine(&self, _config: &ProfitConfig, acc: &f64) -> f64 {
    *acc
  }

  fn reduce(&self, summaries: Vec<f64>) -> f64 {
    summaries.into_iter().fold(0.0, saturating_add)
  }
}
