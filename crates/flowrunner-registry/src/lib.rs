//! Flowrunner Registry
//!
//! Resolves a node's dotted function name to either a control-flow
//! primitive (handled by the interpreter, which owns `evaluate` and the
//! run's `Environment`) or a built-in async call. Carries the allow-list
//! check named by `InvalidFunction`.

mod builtin;
mod control;
mod error;
mod http;
mod json_extract;
mod operator;
mod regex_fn;
mod registry;

pub use builtin::BuiltinFn;
pub use control::ControlFlow;
pub use error::RegistryError;
pub use json_extract::extract_json;
pub use operator::Operator;
pub use registry::{FunctionRegistry, Resolved};
