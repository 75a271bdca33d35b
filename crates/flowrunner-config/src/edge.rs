use serde::{Deserialize, Serialize};

use crate::handle::Handle;

/// A typed connection between two nodes. `source_handle`/`target_handle`
/// classify the edge into exactly one role — see `flowrunner_flow` for the
/// classification logic, which is deliberately kept out of this crate since
/// it depends on knowing the full edge set, not just one edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
  pub id: String,
  pub source: String,
  #[serde(default)]
  pub source_handle: Option<Handle>,
  pub target: String,
  pub target_handle: Handle,
}
