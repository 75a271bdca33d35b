use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::RegistryError;

/// A function resolvable by dotted name and invoked with positional and
/// keyword arguments, the same calling convention a node uses against its
/// arg/kwarg edges. Built-ins are always async at this boundary even if
/// their body is synchronous — the interpreter never needs to know which.
#[async_trait]
pub trait BuiltinFn: Send + Sync {
  async fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, RegistryError>;
}

pub(crate) fn arg(args: &[Value], index: usize, name: &str) -> Result<Value, RegistryError> {
  args
    .get(index)
    .cloned()
    .ok_or_else(|| RegistryError::CallFailed {
      function: name.to_string(),
      message: format!("expected at least {} argument(s)", index + 1),
    })
}
