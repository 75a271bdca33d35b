use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::edge::Edge;
use crate::node::Node;

/// The raw flow payload as it arrives over HTTP, WebSocket, or from a script
/// file on disk. Unknown fields are accepted and ignored by `serde_json`'s
/// default behaviour — we never `deny_unknown_fields` here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDef {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub variables: Map<String, Value>,
  #[serde(default)]
  pub nodes: Vec<Node>,
  #[serde(default)]
  pub edges: Vec<Edge>,
  #[serde(default)]
  pub start_id: Option<String>,
}
