use std::sync::Arc;

use flowrunner_config::FlowDef;
use flowrunner_interpreter::{Interpreter, Notifier, Update};
use flowrunner_registry::FunctionRegistry;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

struct ActiveRun {
  cancel: CancellationToken,
  handle: JoinHandle<()>,
}

/// Runs at most one flow at a time and narrates every state transition on
/// the shared notifier, the way a single WebSocket connection narrated one
/// process's lifecycle in the original: `"Starting process."`,
/// `"Stopping process per user request."`, `"Process completed."`,
/// `"Process already running. Ignoring new process request."`,
/// `"No process running."`.
///
/// A completed run clears its own slot and narrates completion from
/// inside the spawned task, rather than requiring a caller to poll for it.
pub struct Supervisor {
  active: Arc<Mutex<Option<ActiveRun>>>,
  registry: FunctionRegistry,
}

impl Supervisor {
  pub fn new(registry: FunctionRegistry) -> Self {
    Self {
      active: Arc::new(Mutex::new(None)),
      registry,
    }
  }

  /// Start a new run unless one is already active. Returns the narration
  /// string to send back to the caller; never returns an error for a
  /// rejected start, since "already running" is an ordinary outcome, not
  /// a failure of this call.
  pub async fn start(&self, def: FlowDef, notifier: Arc<dyn Notifier>) -> String {
    let mut active = self.active.lock().await;
    if active.is_some() {
      return "Process already running. Ignoring new process request.".to_string();
    }

    let flow = match flowrunner_flow::Flow::try_from(def) {
      Ok(flow) => flow,
      Err(e) => return format!("Invalid flow data: {e}"),
    };

    let cancel = CancellationToken::new();
    let interpreter = Interpreter::with_notifier(flow, self.registry.clone(), cancel.clone(), notifier.clone());

    let active_slot = self.active.clone();
    let handle = tokio::spawn(async move {
      let result = interpreter.run().await;
      if result.is_ok() {
        notifier.notify(Update::Lifecycle("Process completed.".to_string()));
      }
      active_slot.lock().await.take();
    });

    *active = Some(ActiveRun { cancel, handle });
    info!("flow run started");
    "Starting process.".to_string()
  }

  /// Cancel the active run, if there is one.
  pub async fn stop(&self) -> String {
    let active = self.active.lock().await.take();
    match active {
      Some(run) => {
        run.cancel.cancel();
        run.handle.abort();
        "Stopping process per user request.".to_string()
      }
      None => "No process running.".to_string(),
    }
  }

  pub async fn is_running(&self) -> bool {
    self.active.lock().await.is_some()
  }
}
