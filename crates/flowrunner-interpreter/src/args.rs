use flowrunner_env::IGNORE;
use serde_json::{Map, Value};

use crate::error::InterpreterError;
use crate::interpreter::Interpreter;

impl Interpreter {
  /// Resolve an upstream edge's value. If `source_handle` names a key
  /// already present in the environment (and isn't `"__ignore__"`), that
  /// key's value is used directly instead of the source node's own
  /// output. `"__ignore__"` skips that override — it means "evaluate the
  /// source for its side effects", not "use null" — so it falls through
  /// to evaluating `source` and returning its value like any other edge.
  async fn resolve_edge_value(&self, source: &str, source_handle: Option<&str>) -> Result<Value, InterpreterError> {
    if let Some(handle) = source_handle {
      if handle != IGNORE {
        if let Some(value) = self.state.lock().await.env.get(handle).cloned() {
          return Ok(value);
        }
      }
    }
    self.evaluate(source).await
  }

  /// Positional arguments come from arg edges first, falling back to the
  /// node's own literal `args` for positions no edge covers. A position
  /// with neither an edge nor a literal is an out-of-range gap.
  pub(crate) async fn get_args(&self, id: &str) -> Result<Vec<Value>, InterpreterError> {
    let node = self.flow.get_node(id).unwrap_or_else(|| panic!("flow validation guarantees node {id} exists"));
    let arg_edges = self.flow.arg_edges_to(id);
    let literal = node.args.clone().unwrap_or_default();

    let max_edge_index = arg_edges.iter().map(|(index, _)| *index).max();
    let len = match max_edge_index {
      Some(max) => (max + 1).max(literal.len()),
      None => literal.len(),
    };

    let mut args = Vec::with_capacity(len);
    for index in 0..len {
      if let Some((_, edge)) = arg_edges.iter().find(|(i, _)| *i == index) {
        let source_handle = edge.source_handle.as_ref().and_then(|h| h.as_str());
        let value = self.resolve_edge_value(&edge.source, source_handle).await.map_err(|e| InterpreterError::ArgumentError {
          node_id: id.to_string(),
          message: e.to_string(),
        })?;
        args.push(value);
      } else if let Some(value) = literal.get(index) {
        args.push(value.clone());
      } else {
        return Err(InterpreterError::ArgumentError {
          node_id: id.to_string(),
          message: format!("positional argument {index} has no edge and no literal value"),
        });
      }
    }

    Ok(args)
  }

  /// Keyword arguments start from the node's literal `kwargs`, are
  /// overridden by kwarg edges, and finally get the exception-edge
  /// injections merged in: for every exception edge leaving this node,
  /// `kwargs[source_handle] = target_node_id` as a plain string, a
  /// design-time wiring hint rather than a value to evaluate.
  pub(crate) async fn get_kwargs(&self, id: &str) -> Result<Map<String, Value>, InterpreterError> {
    let node = self.flow.get_node(id).unwrap_or_else(|| panic!("flow validation guarantees node {id} exists"));
    let mut kwargs = node.kwargs.clone().unwrap_or_default();

    for edge in self.flow.kwarg_edges_to(id) {
      let key = edge.target_handle.to_string();
      let source_handle = edge.source_handle.as_ref().and_then(|h| h.as_str());
      let value = self.resolve_edge_value(&edge.source, source_handle).await.map_err(|e| InterpreterError::KeywordArgumentError {
        node_id: id.to_string(),
        message: e.to_string(),
      })?;
      kwargs.insert(key, value);
    }

    for edge in self.flow.exception_edges_from(id) {
      let Some(key) = edge.source_handle.as_ref().and_then(|h| h.as_str()) else {
        return Err(InterpreterError::SetExceptionsError {
          node_id: id.to_string(),
          message: format!("exception edge {} has no source_handle to key the injected kwarg on", edge.id),
        });
      };
      kwargs.insert(key.to_string(), Value::String(edge.target.clone()));
    }

    Ok(kwargs)
  }
}
