use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
  #[error("invalid flow data: {0}")]
  InvalidFlow(#[from] flowrunner_flow::FlowError),

  #[error(transparent)]
  Run(#[from] flowrunner_interpreter::InterpreterError),
}
