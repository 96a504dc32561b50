//! The traits native scripts implement.

use crate::error::Result;
use crate::types::{ScriptHit, ScriptParams};
use serde_json::{Map, Value};

/// A script evaluated once per matching document during a search.
///
/// Search scripts back script fields, filters and score functions. They are
/// created per search by a [`ScriptFactory`] and must not hold mutable state,
/// so one instance can serve every document of a shard.
pub trait SearchScript: Send + Sync {
  /// Produces the script value for one document.
  fn run(&self, hit: ScriptHit<'_>) -> Result<Value>;
}

/// A script that rewrites a document's source before it is indexed.
pub trait TransformScript: Send + Sync {
  /// Transforms the `_source` of a document in place.
  fn transform(&self, source: &mut Map<String, Value>);
}

/// A script instance produced by a factory.
pub enum NativeScript {
  /// Runs at search time against each matching document.
  Search(Box<dyn SearchScript>),
  /// Runs at index time against each document source.
  Transform(Box<dyn TransformScript>),
}

impl NativeScript {
  /// Returns the search script, if this is one.
  pub fn as_search(&self) -> Option<&dyn SearchScript> {
    match self {
      Self::Search(script) => Some(script.as_ref()),
      Self::Transform(_) => None,
    }
  }

  /// Returns the transform script, if this is one.
  pub fn as_transform(&self) -> Option<&dyn TransformScript> {
    match self {
      Self::Transform(script) => Some(script.as_ref()),
      Self::Search(_) => None,
    }
  }
}

/// Creates script instances from per-request parameters.
///
/// The factory is registered once; [`ScriptFactory::new_script`] is called
/// for every search (or every mapping using a transform) on every shard, so
/// it is the place to validate parameters.
pub trait ScriptFactory: Send + Sync {
  /// The name the script is registered under.
  fn name(&self) -> &str;

  /// Whether the script reads the query score of documents.
  fn needs_scores(&self) -> bool {
    false
  }

  /// Builds a script from its parameters.
  ///
  /// # Errors
  ///
  /// Returns a configuration error if a required parameter is missing or a
  /// parameter has the wrong type.
  fn new_script(&self, params: Option<&ScriptParams>) -> Result<NativeScript>;
}
