//! Flowrunner Interpreter
//!
//! The chain-driven evaluator: `evaluate` resolves one node's arguments
//! (lazily pulling and memoising whatever upstream nodes it depends on),
//! calls its function, narrates the result, and continues to the next node
//! on its exec edge until the chain runs out or is cancelled.

mod args;
mod control;
mod error;
mod interpreter;
mod notify;

pub use error::InterpreterError;
pub use interpreter::Interpreter;
pub use notify::{format_duration, ChannelNotifier, NoopNotifier, Notifier, Update};

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use flowrunner_config::{Edge, FlowDef, Handle, Node};
  use flowrunner_flow::Flow;
  use flowrunner_registry::FunctionRegistry;
  use serde_json::{json, Map};
  use tokio_util::sync::CancellationToken;

  use super::*;

  fn node(id: &str, function: Option<&str>, args: Option<Vec<serde_json::Value>>) -> Node {
    Node {
      id: id.to_string(),
      node_type: "component".to_string(),
      function: function.map(str::to_string),
      args,
      kwargs: None,
      next_function: None,
    }
  }

  fn edge(id: &str, source: &str, source_handle: Option<&str>, target: &str, target_handle: &str) -> Edge {
    Edge {
      id: id.to_string(),
      source: source.to_string(),
      source_handle: source_handle.map(Handle::from),
      target: target.to_string(),
      target_handle: Handle::from(target_handle),
    }
  }

  fn interpreter(def: FlowDef) -> Interpreter {
    let flow = Flow::try_from(def).unwrap();
    Interpreter::new(flow, FunctionRegistry::new(), CancellationToken::new())
  }

  #[tokio::test]
  async fn chains_through_exec_edges_and_memoises_values() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![
        node("a", Some("operator.add"), Some(vec![json!(2), json!(3)])),
        node("b", Some("operator.mul"), Some(vec![json!(0), json!(10)])),
      ],
      edges: vec![
        edge("e0", "a", Some("start"), "a", "e-in"),
        edge("e1", "a", Some("e-out"), "b", "e-in"),
        edge("e2", "a", None, "b", "0"),
      ],
      start_id: None,
    };

    let interp = interpreter(def);
    let variables = interp.run().await.unwrap();
    assert_eq!(variables.get("a"), Some(&json!(5.0)));
    assert_eq!(variables.get("b"), Some(&json!(50.0)));
  }

  #[tokio::test]
  async fn set_variable_writes_into_the_store() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a", Some("set_variable"), Some(vec![json!("counter"), json!(1)]))],
      edges: vec![edge("e0", "a", Some("start"), "a", "e-in")],
      start_id: None,
    };

    let interp = interpreter(def);
    let variables = interp.run().await.unwrap();
    assert_eq!(variables.get("counter"), Some(&json!(1)));
  }

  #[tokio::test]
  async fn branch_steers_the_chain_to_the_chosen_target() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![
        node("cond", Some("branch"), Some(vec![json!(true), json!("yes"), json!("no")])),
        node("yes", Some("set_variable"), Some(vec![json!("path"), json!("yes")])),
        node("no", Some("set_variable"), Some(vec![json!("path"), json!("no")])),
      ],
      edges: vec![edge("e0", "cond", Some("start"), "cond", "e-in")],
      start_id: None,
    };

    let interp = interpreter(def);
    let variables = interp.run().await.unwrap();
    assert_eq!(variables.get("path"), Some(&json!("yes")));
    assert!(!variables.contains_key("no"));
  }

  #[tokio::test]
  async fn invalid_function_is_rejected_by_the_allow_list() {
    let registry = FunctionRegistry::new().with_allow_list(HashSet::new());
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a", Some("operator.add"), Some(vec![json!(1), json!(2)]))],
      edges: vec![edge("e0", "a", Some("start"), "a", "e-in")],
      start_id: None,
    };
    let flow = Flow::try_from(def).unwrap();
    let interp = Interpreter::new(flow, registry, CancellationToken::new());

    let err = interp.run().await.unwrap_err();
    assert!(matches!(err, InterpreterError::ProcessRunError { .. }));
  }

  #[tokio::test]
  async fn for_each_harvests_per_iteration_locals_and_keeps_globals() {
    let mut seed = Map::new();
    seed.insert("seed".to_string(), json!(100));

    let def = FlowDef {
      id: None,
      name: None,
      variables: seed,
      nodes: vec![
        node("loop", Some("for_each"), Some(vec![json!([1, 2, 3]), json!("double")])),
        node("double", Some("operator.mul"), None),
      ],
      edges: vec![
        edge("e0", "loop", Some("start"), "loop", "e-in"),
        edge("e1", "loop", None, "double", "0"),
        edge("e2", "loop", None, "double", "1"),
      ],
      start_id: None,
    };

    let interp = interpreter(def);
    let variables = interp.run().await.unwrap();

    // The loop variable ("loop") and the body's own result ("double") have
    // no `__` in their names either, but neither was a global key at call
    // time, so they must still land in each iteration's own bucket instead
    // of being swept into the shared globals.
    assert_eq!(variables.get("loop__0"), Some(&json!({"loop": 1, "double": 1.0})));
    assert_eq!(variables.get("loop__1"), Some(&json!({"loop": 2, "double": 4.0})));
    assert_eq!(variables.get("loop__2"), Some(&json!({"loop": 3, "double": 9.0})));

    // A key that really was global at call time is untouched by the loop.
    assert_eq!(variables.get("seed"), Some(&json!(100)));
  }
}
