//! Searus Scripts - native scripts and scripted metric aggregations.
//!
//! Provides search scripts (`is_prime`, `score_factor`), an index-time
//! transform (`split_transform`) and scripted metric aggregations built on a
//! four phase `init -> map -> combine -> reduce` contract.

pub mod aggregation;
pub mod engine;
pub mod error;
pub mod params;
pub mod plugin;
pub mod registry;
pub mod script;
pub mod scripts;
pub mod settings;
pub mod types;

pub use error::{Result, ScriptError};

pub mod prelude {
  //! Convenient re-exports for common types and traits.

  pub use crate::aggregation::*;
  pub use crate::engine::*;
  pub use crate::error::*;
  pub use crate::params::*;
  pub use crate::plugin::*;
  pub use crate::registry::*;
  pub use crate::script::*;
  pub use crate::scripts::*;
  pub use crate::settings::*;
  pub use crate::types::*;
}
