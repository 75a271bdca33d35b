use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use flowrunner_env::Environment;
use flowrunner_flow::Flow;
use flowrunner_registry::{FunctionRegistry, Resolved};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::InterpreterError;
use crate::notify::{format_duration, Notifier, NoopNotifier, Update};

/// Mutable state shared across every `evaluate` call for one run. Held
/// behind a single lock rather than split into several so `branch` and a
/// memoised write always see a consistent snapshot of each other.
pub(crate) struct RunState {
  pub(crate) env: Environment,
  pub(crate) next_overrides: HashMap<String, String>,
}

/// Drives one run of a flow to completion. Cheap to clone — everything is
/// behind an `Arc` — so control-flow primitives that need concurrent
/// sub-evaluation (`parallel`) or in-place re-entry (`for_each`) just clone
/// the interpreter rather than threading references through.
#[derive(Clone)]
pub struct Interpreter {
  pub(crate) flow: Arc<Flow>,
  pub(crate) registry: Arc<FunctionRegistry>,
  pub(crate) state: Arc<Mutex<RunState>>,
  pub(crate) cancel: CancellationToken,
  pub(crate) notifier: Arc<dyn Notifier>,
}

impl Interpreter {
  pub fn new(flow: Flow, registry: FunctionRegistry, cancel: CancellationToken) -> Self {
    Self::with_notifier(flow, registry, cancel, Arc::new(NoopNotifier))
  }

  pub fn with_notifier(flow: Flow, registry: FunctionRegistry, cancel: CancellationToken, notifier: Arc<dyn Notifier>) -> Self {
    let variables = flow.variables.clone();
    Self {
      flow: Arc::new(flow),
      registry: Arc::new(registry),
      state: Arc::new(Mutex::new(RunState {
        env: Environment::new(variables),
        next_overrides: HashMap::new(),
      })),
      cancel,
      notifier,
    }
  }

  /// Run the flow to completion starting from its entry node, returning
  /// the full variable store on success. On failure, wraps whatever went
  /// wrong into a `ProcessRunError` carrying a dump of the flow id and the
  /// variables accumulated before the failure, and narrates it on the
  /// update channel the same way any other lifecycle event is narrated.
  pub async fn run(&self) -> Result<Map<String, Value>, InterpreterError> {
    self.notifier.notify(Update::Lifecycle("Starting process.".to_string()));

    let start_id = self.flow.start_id().to_string();
    match self.evaluate(&start_id).await {
      Ok(_) => Ok(self.state.lock().await.env.as_map().clone()),
      Err(err) => {
        let dump = serde_json::json!({
          "flow_id": self.flow.id,
          "variables": self.state.lock().await.env.as_map().clone(),
        });
        self.notifier.notify(Update::Lifecycle(format!("ERROR: {err}")));
        Err(InterpreterError::ProcessRunError {
          message: err.to_string(),
          dump,
        })
      }
    }
  }

  /// Evaluate a single node, memoising its result, then continue the exec
  /// chain if one leaves this node. Also the mechanism by which an
  /// argument edge lazily pulls an upstream value: since a pure data node
  /// has no outgoing exec edge, chaining from it is a no-op.
  ///
  /// Cancellation is checked at the pre-emption yield right at the top,
  /// before this node resolves args, invokes, or emits anything — a node
  /// already in flight runs to completion, but once cancelled no further
  /// node is entered for real.
  pub(crate) fn evaluate<'a>(&'a self, id: &'a str) -> Pin<Box<dyn Future<Output = Result<Value, InterpreterError>> + Send + 'a>> {
    Box::pin(async move {
      tokio::task::yield_now().await;

      if self.cancel.is_cancelled() {
        warn!(node_id = id, "run cancelled, node skipped");
        return Ok(Value::Null);
      }

      if let Some(cached) = self.state.lock().await.env.get(id).cloned() {
        return Ok(cached);
      }

      let node = self
        .flow
        .get_node(id)
        .unwrap_or_else(|| panic!("flow validation guarantees node {id} exists"));

      let args = self.get_args(id).await?;
      let kwargs = self.get_kwargs(id).await?;

      let result = match &node.function {
        None => args.first().cloned().unwrap_or(Value::Null),
        Some(function) => {
          let started = Instant::now();
          let value = self.call_function(id, function, args, kwargs).await?;
          let elapsed = started.elapsed();
          debug!(node_id = id, function, duration = %format_duration(elapsed), "node evaluated");

          self.state.lock().await.env.set(id.to_string(), value.clone());
          self.notifier.notify(Update::NodeCompleted {
            node_id: id.to_string(),
            data: value.clone(),
            duration: format_duration(elapsed),
          });
          value
        }
      };

      if node.function.is_none() {
        self.state.lock().await.env.set(id.to_string(), result.clone());
      }

      if let Some(next) = self.next_of(id).await {
        self.evaluate(&next).await?;
      }

      Ok(result)
    })
  }

  pub(crate) async fn next_of(&self, id: &str) -> Option<String> {
    let state = self.state.lock().await;
    if let Some(next) = state.next_overrides.get(id) {
      return Some(next.clone());
    }
    self.flow.next_of(id).map(str::to_string)
  }

  async fn call_function(&self, id: &str, function: &str, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, InterpreterError> {
    match self.registry.resolve(function) {
      Ok(Resolved::Control(control)) => self.call_control_flow(id, control, args, kwargs).await,
      Ok(Resolved::Builtin(builtin)) => builtin.call(args, kwargs).await.map_err(|e| InterpreterError::FunctionCallError {
        node_id: id.to_string(),
        function: function.to_string(),
        message: e.to_string(),
      }),
      Err(e) => Err(InterpreterError::InvalidFunction {
        node_id: id.to_string(),
        function: function.to_string(),
        message: e.to_string(),
      }),
    }
  }
}
