//! Flowrunner Env
//!
//! The per-run variable store. Every evaluated node memoises its result
//! here under its own id, and `set_variable` writes into it directly. The
//! `for_each` control-flow primitive needs to snapshot and restore a subset
//! of this store across iterations — the helpers for that live here rather
//! than in the interpreter so the global/local split has one definition.

use serde_json::{Map, Value};

/// A value edges can put in `source_handle` to mean "evaluate the upstream
/// node but don't take its value" — the interpreter treats this exactly
/// like an absent value and still resolves the referenced node for its
/// side effects.
pub const IGNORE: &str = "__ignore__";

/// A key is considered a loop-global (survives across `for_each`
/// iterations and affects iterations after the one that set it) unless its
/// name contains a double underscore. Per-iteration memoised values are
/// named `{action_id}__{index}`, so this rule also keeps prior iterations'
/// results from leaking into the next iteration's globals snapshot.
pub fn is_global_key(key: &str) -> bool {
  !key.contains("__")
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
  values: Map<String, Value>,
}

impl Environment {
  pub fn new(seed: Map<String, Value>) -> Self {
    Self { values: seed }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(key)
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn set(&mut self, key: impl Into<String>, value: Value) {
    self.values.insert(key.into(), value);
  }

  pub fn as_map(&self) -> &Map<String, Value> {
    &self.values
  }

  pub fn into_map(self) -> Map<String, Value> {
    self.values
  }

  /// A full copy of the current store, for `for_each`'s per-iteration reset.
  pub fn snapshot(&self) -> Map<String, Value> {
    self.values.clone()
  }

  /// The subset of the current store considered global (see `is_global_key`).
  pub fn snapshot_globals(&self) -> Map<String, Value> {
    self.values.iter().filter(|(k, _)| is_global_key(k)).map(|(k, v)| (k.clone(), v.clone())).collect()
  }

  /// Replace the store wholesale — used to reset to a globals snapshot
  /// before each `for_each` iteration.
  pub fn restore(&mut self, values: Map<String, Value>) {
    self.values = values;
  }

  /// Insert every entry from `values`, overwriting existing keys. Used to
  /// merge `for_each`'s collected per-iteration results back in once the
  /// loop completes.
  pub fn merge(&mut self, values: Map<String, Value>) {
    self.values.extend(values);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn global_keys_have_no_double_underscore() {
    assert!(is_global_key("counter"));
    assert!(!is_global_key("loop1__0"));
  }

  #[test]
  fn snapshot_globals_excludes_iteration_results() {
    let mut env = Environment::new(Map::new());
    env.set("counter", json!(1));
    env.set("loop1__0", json!({"x": 1}));

    let globals = env.snapshot_globals();
    assert!(globals.contains_key("counter"));
    assert!(!globals.contains_key("loop1__0"));
  }

  #[test]
  fn restore_replaces_the_whole_store() {
    let mut env = Environment::new(Map::new());
    env.set("a", json!(1));
    env.set("b", json!(2));

    let mut snap = Map::new();
    snap.insert("a".to_string(), json!(1));
    env.restore(snap);

    assert!(!env.contains("b"));
    assert_eq!(env.get("a"), Some(&json!(1)));
  }

  #[test]
  fn merge_overwrites_existing_keys() {
    let mut env = Environment::new(Map::new());
    env.set("a", json!(1));

    let mut incoming = Map::new();
    incoming.insert("a".to_string(), json!(2));
    incoming.insert("b".to_string(), json!(3));
    env.merge(incoming);

    assert_eq!(env.get("a"), Some(&json!(2)));
    assert_eq!(env.get("b"), Some(&json!(3)));
  }
}
