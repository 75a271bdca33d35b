use std::collections::HashSet;
use std::sync::Arc;

use crate::builtin::BuiltinFn;
use crate::control::ControlFlow;
use crate::error::RegistryError;
use crate::http::{HttpGet, HttpPost};
use crate::json_extract::JsonExtract;
use crate::operator::Operator;
use crate::regex_fn::{RegexFindAll, RegexMatch};

/// What a dotted function name resolves to. Control-flow primitives are
/// handled by the interpreter directly; everything else is an ordinary
/// async call.
pub enum Resolved {
  Control(ControlFlow),
  Builtin(Arc<dyn BuiltinFn>),
}

/// Resolves a node's `function` name to something callable.
///
/// Names under `custom.` have no dynamic-import equivalent here — callers
/// register them explicitly with `register_custom` at startup instead of
/// relying on a rewritten import path. Everything else dispatches to a
/// fixed built-in surface (`operator.*`, `http.*`, `regex.*`, `json.*`) or
/// one of the control-flow primitive names.
#[derive(Clone)]
pub struct FunctionRegistry {
  custom: std::collections::HashMap<String, Arc<dyn BuiltinFn>>,
  allow_list: Option<HashSet<String>>,
}

impl FunctionRegistry {
  pub fn new() -> Self {
    Self {
      custom: std::collections::HashMap::new(),
      allow_list: None,
    }
  }

  /// Restrict this run to only the named functions (plus control-flow
  /// primitives, which are always reachable since a flow cannot express
  /// branching without them).
  pub fn with_allow_list(mut self, allow_list: HashSet<String>) -> Self {
    self.allow_list = Some(allow_list);
    self
  }

  pub fn register_custom(&mut self, name: impl Into<String>, function: Arc<dyn BuiltinFn>) {
    self.custom.insert(name.into(), function);
  }

  pub fn resolve(&self, name: &str) -> Result<Resolved, RegistryError> {
    if let Some(control) = ControlFlow::by_name(name) {
      return Ok(Resolved::Control(control));
    }

    if let Some(allow_list) = &self.allow_list {
      if !allow_list.contains(name) {
        return Err(RegistryError::NotAllowed(name.to_string()));
      }
    }

    if let Some(custom) = self.custom.get(name) {
      return Ok(Resolved::Builtin(custom.clone()));
    }

    if let Some(op) = Operator::by_name(name) {
      return Ok(Resolved::Builtin(Arc::new(op)));
    }

    let builtin: Arc<dyn BuiltinFn> = match name {
      "http.get" => Arc::new(HttpGet),
      "http.post" => Arc::new(HttpPost),
      "regex.match" => Arc::new(RegexMatch),
      "regex.find_all" => Arc::new(RegexFindAll),
      "json.extract" => Arc::new(JsonExtract),
      _ => return Err(RegistryError::NotFound(name.to_string())),
    };

    Ok(Resolved::Builtin(builtin))
  }
}

impl Default for FunctionRegistry {
  fn default() -> Self {
    Self::new()
  }
}
