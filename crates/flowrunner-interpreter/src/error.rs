use serde_json::Value;
use thiserror::Error;

/// The closed set of errors a run can end in. Every failure inside
/// `evaluate` is caught at the node boundary and rewrapped into one of
/// these kinds rather than left as an opaque `anyhow`-style error, so a
/// caller can match on what went wrong without string-sniffing.
#[derive(Debug, Error)]
pub enum InterpreterError {
  #[error(transparent)]
  FlowMalformed(#[from] flowrunner_flow::FlowError),

  #[error("node {node_id}: function {function} is not callable here: {message}")]
  InvalidFunction {
    node_id: String,
    function: String,
    message: String,
  },

  #[error("node {node_id}: argument resolution failed: {message}")]
  ArgumentError { node_id: String, message: String },

  #[error("node {node_id}: keyword argument resolution failed: {message}")]
  KeywordArgumentError { node_id: String, message: String },

  #[error("node {node_id}: could not wire exception edges: {message}")]
  SetExceptionsError { node_id: String, message: String },

  #[error("node {node_id}: call to {function} failed: {message}")]
  FunctionCallError {
    node_id: String,
    function: String,
    message: String,
  },

  #[error("node {node_id}: function raised during execution: {message}")]
  FunctionRunError { node_id: String, message: String },

  #[error("node {node_id}: branch failed: {message}")]
  BranchError { node_id: String, message: String },

  #[error("node {node_id}: for_each failed: {message}")]
  ForEachError { node_id: String, message: String },

  #[error("node {node_id}: sequence failed: {message}")]
  SequenceError { node_id: String, message: String },

  #[error("node {node_id}: JSON extraction failed: {message}")]
  JSONExtractionError { node_id: String, message: String },

  #[error("process run failed: {message}")]
  ProcessRunError { message: String, dump: Value },
}

impl InterpreterError {
  /// Every variant but the process-level wrapper carries the id of the
  /// node it happened at, which the top-level `run` needs to build the
  /// `ProcessRunError` dump.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      InterpreterError::InvalidFunction { node_id, .. }
      | InterpreterError::ArgumentError { node_id, .. }
      | InterpreterError::KeywordArgumentError { node_id, .. }
      | InterpreterError::SetExceptionsError { node_id, .. }
      | InterpreterError::FunctionCallError { node_id, .. }
      | InterpreterError::FunctionRunError { node_id, .. }
      | InterpreterError::BranchError { node_id, .. }
      | InterpreterError::ForEachError { node_id, .. }
      | InterpreterError::SequenceError { node_id, .. }
      | InterpreterError::JSONExtractionError { node_id, .. } => Some(node_id),
      InterpreterError::FlowMalformed(_) | InterpreterError::ProcessRunError { .. } => None,
    }
  }
}
