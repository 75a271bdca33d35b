use std::sync::Arc;

use flowrunner_config::FlowDef;
use flowrunner_interpreter::{Interpreter, Notifier};
use flowrunner_registry::FunctionRegistry;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::DriverError;

/// Runs one flow to completion and returns its final variable store — the
/// CLI's script mode, with no supervisor and no concurrent-trigger state
/// machine around it.
pub async fn run_to_completion(def: FlowDef, registry: FunctionRegistry, notifier: Arc<dyn Notifier>) -> Result<Map<String, Value>, DriverError> {
  let flow = flowrunner_flow::Flow::try_from(def)?;
  let interpreter = Interpreter::with_notifier(flow, registry, CancellationToken::new(), notifier);
  Ok(interpreter.run().await.map_err(DriverError::Run)?)
}
