use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
  #[error("edge {edge_id} references unknown node {node_id}")]
  UnknownNode { edge_id: String, node_id: String },

  #[error("no start node found: no edge has source_handle \"start\" and no start_id was given")]
  NoStartNode,

  #[error("ambiguous start: {count} edges have source_handle \"start\", expected exactly one")]
  AmbiguousStart { count: usize },

  #[error("start_id {0} does not name any node in this flow")]
  StartNodeNotFound(String),

  #[error("exec edge {0} re-enters a node already on its own chain, forming a cycle")]
  ExecCycle(String),
}
