use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Everything an observer can learn about a run: a structured record per
/// evaluated node, or a bare string for the coarser lifecycle events
/// (`"Starting process."`, `"Stopping process per user request."`, ...).
/// Keeping both shapes on one channel matches how the original process
/// update callback was used — sometimes with a dict, sometimes with plain
/// text.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Update {
  NodeCompleted {
    node_id: String,
    data: Value,
    duration: String,
  },
  Lifecycle(String),
}

/// Formats a wall-clock duration the way the original process log did:
/// microseconds under a millisecond, milliseconds under a second,
/// otherwise seconds.
pub fn format_duration(d: Duration) -> String {
  let micros = d.as_micros();
  if micros < 1_000 {
    format!("{micros}μs")
  } else if micros < 1_000_000 {
    format!("{:.2}ms", d.as_secs_f64() * 1_000.0)
  } else {
    format!("{:.2}s", d.as_secs_f64())
  }
}

/// Receives every `Update` emitted during a run. Notification is
/// fire-and-forget: a run never blocks on, or fails because of, a slow or
/// absent observer.
pub trait Notifier: Send + Sync {
  fn notify(&self, update: Update);
}

pub struct NoopNotifier;

impl Notifier for NoopNotifier {
  fn notify(&self, _update: Update) {}
}

/// Forwards updates over an unbounded channel. Unbounded because a run
/// must never stall waiting for a slow consumer to drain; the tradeoff is
/// that a consumer that never reads at all leaks memory for the lifetime
/// of the run.
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<Update>,
}

impl ChannelNotifier {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<Update>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Self { sender }, receiver)
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, update: Update) {
    let _ = self.sender.send(update);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sub_millisecond_durations_are_microseconds() {
    assert_eq!(format_duration(Duration::from_micros(500)), "500μs");
  }

  #[test]
  fn sub_second_durations_are_milliseconds() {
    assert_eq!(format_duration(Duration::from_millis(250)), "250.00ms");
  }

  #[test]
  fn durations_past_a_second_are_seconds() {
    assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
  }
}
