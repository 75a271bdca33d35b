use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
  #[error("function {0} is not on the allow-list for this run")]
  NotAllowed(String),

  #[error("no function registered under {0}")]
  NotFound(String),

  #[error("{function} failed: {message}")]
  CallFailed { function: String, message: String },
}
