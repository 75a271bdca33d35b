use std::collections::HashSet;

use flowrunner_registry::ControlFlow;
use futures::future::join_all;
use serde_json::{Map, Value};

use crate::error::InterpreterError;
use crate::interpreter::Interpreter;

impl Interpreter {
  pub(crate) async fn call_control_flow(&self, id: &str, control: ControlFlow, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    match control {
      ControlFlow::Branch => self.branch(id, args, kwargs).await,
      ControlFlow::Sequence => self.sequence(id, args, kwargs).await,
      ControlFlow::Parallel => self.parallel(id, args, kwargs).await,
      ControlFlow::ForEach => self.for_each(id, args, kwargs).await,
      ControlFlow::SetVariable => self.set_variable(id, args, kwargs).await,
      ControlFlow::ExtractJson => self.extract_json_node(id, args, kwargs).await,
    }
  }

  /// Chooses `true` or `false` by writing into `next_overrides` so the
  /// caller's normal chain-continuation in `evaluate` picks it up — branch
  /// itself never recurses into the chosen node.
  async fn branch(&self, id: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    let condition = kwargs
      .get("condition")
      .or_else(|| args.first())
      .ok_or_else(|| InterpreterError::BranchError {
        node_id: id.to_string(),
        message: "no condition given".to_string(),
      })?;

    let condition = condition.as_bool().ok_or_else(|| InterpreterError::BranchError {
      node_id: id.to_string(),
      message: format!("condition must be a boolean, got {condition}"),
    })?;

    let target_key = if condition { "true" } else { "false" };
    let positional_index = if condition { 1 } else { 2 };
    let target = kwargs
      .get(target_key)
      .or_else(|| args.get(positional_index))
      .and_then(Value::as_str)
      .ok_or_else(|| InterpreterError::BranchError {
        node_id: id.to_string(),
        message: format!("no {target_key} target given"),
      })?
      .to_string();

    self.state.lock().await.next_overrides.insert(id.to_string(), target.clone());
    Ok(Value::String(target))
  }

  async fn sequence(&self, id: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    let items = self.node_ids_argument(id, "sequence", &args, &kwargs)?;

    let mut results = Vec::with_capacity(items.len());
    for item in items {
      let value = self.evaluate(&item).await.map_err(|e| InterpreterError::SequenceError {
        node_id: id.to_string(),
        message: e.to_string(),
      })?;
      results.push(value);
    }
    Ok(Value::Array(results))
  }

  /// Evaluates every id concurrently and waits for all of them. Failures
  /// are folded into one `FunctionRunError`: with several branches
  /// possibly failing at once there is no single node to blame the way a
  /// plain call failure has.
  async fn parallel(&self, id: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    let items = self.node_ids_argument(id, "parallel", &args, &kwargs)?;

    let futures = items.iter().map(|item| self.evaluate(item));
    let results = join_all(futures).await;

    let mut values = Vec::with_capacity(results.len());
    for result in results {
      match result {
        Ok(value) => values.push(value),
        Err(e) => {
          return Err(InterpreterError::FunctionRunError {
            node_id: id.to_string(),
            message: format!("parallel branch failed: {e}"),
          })
        }
      }
    }
    Ok(Value::Array(values))
  }

  /// Runs `next_function` once per array item, in place: before each
  /// iteration the store is reset to a snapshot of the loop-global keys
  /// (those without `__` in their name) plus the item under this node's
  /// own id, and whatever the iteration produces beyond the globals is
  /// harvested into `{id}__{index}`. Globals picked up mid-loop (a nested
  /// `set_variable`, say) carry forward into later iterations.
  ///
  /// The global/local split is decided once, from the key names present
  /// before the first iteration — not re-derived per key at harvest time.
  /// A key created during the loop body (the loop variable itself, a
  /// result keyed by node id) has no `__` in it either, but it is not one
  /// of the names fixed at call time, so it is still a local and lands in
  /// that iteration's bucket instead of silently joining the globals.
  async fn for_each(&self, id: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    let array = kwargs
      .get("array")
      .or_else(|| args.first())
      .and_then(Value::as_array)
      .ok_or_else(|| InterpreterError::ForEachError {
        node_id: id.to_string(),
        message: "expected an array".to_string(),
      })?
      .clone();

    let next_function = kwargs
      .get("next_function")
      .or_else(|| args.get(1))
      .and_then(Value::as_str)
      .ok_or_else(|| InterpreterError::ForEachError {
        node_id: id.to_string(),
        message: "no next_function given".to_string(),
      })?
      .to_string();

    let mut globals = self.state.lock().await.env.snapshot_globals();
    let global_keys: HashSet<String> = globals.keys().cloned().collect();
    let mut iteration_results = Map::new();

    for (index, item) in array.into_iter().enumerate() {
      {
        let mut state = self.state.lock().await;
        state.env.restore(globals.clone());
        state.env.set(id.to_string(), item);
      }

      self.evaluate(&next_function).await.map_err(|e| InterpreterError::ForEachError {
        node_id: id.to_string(),
        message: e.to_string(),
      })?;

      let post = self.state.lock().await.env.snapshot();
      let locals: Map<String, Value> = post.iter().filter(|(k, _)| !global_keys.contains(*k)).map(|(k, v)| (k.clone(), v.clone())).collect();
      iteration_results.insert(format!("{id}__{index}"), Value::Object(locals));

      for (k, v) in post.iter().filter(|(k, _)| global_keys.contains(*k)) {
        globals.insert(k.clone(), v.clone());
      }
    }

    self.state.lock().await.env.merge(iteration_results);
    Ok(Value::String("Completed".to_string()))
  }

  async fn set_variable(&self, id: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    let name = kwargs
      .get("variable_name")
      .or_else(|| args.first())
      .and_then(Value::as_str)
      .ok_or_else(|| InterpreterError::ArgumentError {
        node_id: id.to_string(),
        message: "set_variable needs a variable_name".to_string(),
      })?
      .to_string();

    let value = kwargs.get("value").or_else(|| args.get(1)).cloned().unwrap_or(Value::Null);

    self.state.lock().await.env.set(name, value.clone());
    Ok(value)
  }

  async fn extract_json_node(&self, id: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    let json_obj = kwargs.get("json_obj").or_else(|| args.first()).cloned().ok_or_else(|| InterpreterError::JSONExtractionError {
      node_id: id.to_string(),
      message: "no json_obj given".to_string(),
    })?;

    let expression = kwargs
      .get("expression")
      .or_else(|| args.get(1))
      .and_then(Value::as_str)
      .ok_or_else(|| InterpreterError::JSONExtractionError {
        node_id: id.to_string(),
        message: "no expression given".to_string(),
      })?;

    flowrunner_registry::extract_json(&json_obj, expression).map_err(|e| InterpreterError::JSONExtractionError {
      node_id: id.to_string(),
      message: e.to_string(),
    })
  }

  fn node_ids_argument(&self, id: &str, function: &str, args: &[Value], kwargs: &Map<String, Value>) -> Result<Vec<String>, InterpreterError> {
    let array = kwargs
      .get("array")
      .or_else(|| args.first())
      .and_then(Value::as_array)
      .ok_or_else(|| InterpreterError::ArgumentError {
        node_id: id.to_string(),
        message: format!("{function} expected an array of node ids"),
      })?;

    array
      .iter()
      .map(|v| {
        v.as_str().map(str::to_string).ok_or_else(|| InterpreterError::ArgumentError {
          node_id: id.to_string(),
          message: format!("{function} array must contain node id strings"),
        })
      })
      .collect()
  }
}
