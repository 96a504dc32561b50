//! Built-in native scripts.
//!
//! # Available Scripts
//!
//! - [`IsPrimeFactory`]: search script returning whether a numeric field is prime.
//! - [`ScoreFactorFactory`]: script field multiplying the hit score by a factor.
//! - [`SplitTransformFactory`]: index-time transform splitting a delimited string field.
//!
//! The scripted metric aggregations live in [`crate::aggregation`].

/// Implements the `is_prime` search script.
pub mod is_prime;
/// Implements the `score_factor` script field.
pub mod score_factor;
/// Implements the `split_transform` index-time transform.
pub mod split_transform;

pub use is_prime::IsPrimeFactory;
pub use score_factor::ScoreFactorFactory;
pub use split_transform::SplitTransformFactory;
