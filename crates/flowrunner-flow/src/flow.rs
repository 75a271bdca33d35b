use std::collections::HashMap;
use std::collections::HashSet;

use flowrunner_config::{Edge, FlowDef, Node};
use serde_json::{Map, Value};

use crate::error::FlowError;
use crate::graph::{self, Graph};
use crate::role::{classify, EdgeRole};

/// A validated, indexed flow: every edge has been classified into exactly
/// one role, the start node is resolved, and the exec-edge subgraph is
/// known to be acyclic. Once built, a `Flow` never changes shape for the
/// lifetime of a run — per-run mutable state (branch overrides, variables)
/// lives in the interpreter and environment, not here.
#[derive(Debug, Clone)]
pub struct Flow {
  pub id: Option<String>,
  pub name: Option<String>,
  pub variables: Map<String, Value>,
  nodes: HashMap<String, Node>,
  start_id: String,
  exec_targets: HashMap<String, String>,
  exception_edges: HashMap<String, Vec<Edge>>,
  arg_edges: HashMap<String, Vec<(usize, Edge)>>,
  kwarg_edges: HashMap<String, Vec<Edge>>,
  graph: Graph,
}

impl Flow {
  pub fn get_node(&self, id: &str) -> Option<&Node> {
    self.nodes.get(id)
  }

  pub fn start_id(&self) -> &str {
    &self.start_id
  }

  /// The node an exec edge out of `id` leads to, if any. `None` ends the
  /// chain for this node.
  pub fn next_of(&self, id: &str) -> Option<&str> {
    self.exec_targets.get(id).map(String::as_str)
  }

  pub fn exception_edges_from(&self, id: &str) -> &[Edge] {
    self.exception_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn arg_edges_to(&self, id: &str) -> &[(usize, Edge)] {
    self.arg_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn kwarg_edges_to(&self, id: &str) -> &[Edge] {
    self.kwarg_edges.get(id).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn node_ids(&self) -> impl Iterator<Item = &str> {
    self.nodes.keys().map(String::as_str)
  }
}

impl TryFrom<FlowDef> for Flow {
  type Error = FlowError;

  fn try_from(def: FlowDef) -> Result<Self, FlowError> {
    let nodes: HashMap<String, Node> = def.nodes.into_iter().map(|n| (n.id.clone(), n)).collect();

    for edge in &def.edges {
      if !nodes.contains_key(&edge.source) {
        return Err(FlowError::UnknownNode {
          edge_id: edge.id.clone(),
          node_id: edge.source.clone(),
        });
      }
      if !nodes.contains_key(&edge.target) {
        return Err(FlowError::UnknownNode {
          edge_id: edge.id.clone(),
          node_id: edge.target.clone(),
        });
      }
    }

    let mut start_edges = Vec::new();
    let mut exec_targets: HashMap<String, String> = HashMap::new();
    let mut exception_edges: HashMap<String, Vec<Edge>> = HashMap::new();
    let mut arg_edges: HashMap<String, Vec<(usize, Edge)>> = HashMap::new();
    let mut kwarg_edges: HashMap<String, Vec<Edge>> = HashMap::new();

    for edge in &def.edges {
      match classify(edge) {
        EdgeRole::Start => start_edges.push(edge.clone()),
        EdgeRole::Exec => {
          exec_targets.insert(edge.source.clone(), edge.target.clone());
        }
        EdgeRole::Exception => {
          exception_edges.entry(edge.source.clone()).or_default().push(edge.clone());
        }
        EdgeRole::Arg => {
          let index = edge
            .target_handle
            .as_index()
            .expect("Arg role implies a numeric target_handle");
          arg_edges.entry(edge.target.clone()).or_default().push((index, edge.clone()));
        }
        EdgeRole::Kwarg => {
          kwarg_edges.entry(edge.target.clone()).or_default().push(edge.clone());
        }
      }
    }

    for edges in arg_edges.values_mut() {
      edges.sort_by_key(|(index, _)| *index);
    }

    let start_id = match def.start_id {
      Some(id) => {
        if !nodes.contains_key(&id) {
          return Err(FlowError::StartNodeNotFound(id));
        }
        id
      }
      None => match start_edges.len() {
        0 => return Err(FlowError::NoStartNode),
        1 => start_edges[0].target.clone(),
        count => return Err(FlowError::AmbiguousStart { count }),
      },
    };

    let exec_pairs: Vec<(String, String)> =
      exec_targets.iter().map(|(from, to)| (from.clone(), to.clone())).collect();
    let node_id_set: HashSet<String> = nodes.keys().cloned().collect();
    if graph::has_cycle(&node_id_set, &exec_pairs) {
      return Err(FlowError::ExecCycle(start_id));
    }

    let all_pairs: Vec<(String, String)> = def.edges.iter().map(|e| (e.source.clone(), e.target.clone())).collect();
    let graph = Graph::new(nodes.keys().cloned(), &all_pairs);

    Ok(Flow {
      id: def.id,
      name: def.name,
      variables: def.variables,
      nodes,
      start_id,
      exec_targets,
      exception_edges,
      arg_edges,
      kwarg_edges,
      graph,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowrunner_config::Handle;

  fn node(id: &str) -> Node {
    Node {
      id: id.to_string(),
      node_type: "component".to_string(),
      function: Some("custom.noop".to_string()),
      args: None,
      kwargs: None,
      next_function: None,
    }
  }

  fn edge(id: &str, source: &str, source_handle: Option<&str>, target: &str, target_handle: &str) -> Edge {
    Edge {
      id: id.to_string(),
      source: source.to_string(),
      source_handle: source_handle.map(Handle::from),
      target: target.to_string(),
      target_handle: Handle::from(target_handle),
    }
  }

  #[test]
  fn resolves_start_from_start_edge() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a"), node("b")],
      edges: vec![
        edge("e0", "a", Some("start"), "a", "e-in"),
        edge("e1", "a", Some("e-out"), "b", "e-in"),
      ],
      start_id: None,
    };

    let flow = Flow::try_from(def).unwrap();
    assert_eq!(flow.start_id(), "a");
    assert_eq!(flow.next_of("a"), Some("b"));
  }

  #[test]
  fn missing_start_edge_is_flow_malformed() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a")],
      edges: vec![],
      start_id: None,
    };

    assert!(matches!(Flow::try_from(def), Err(FlowError::NoStartNode)));
  }

  #[test]
  fn ambiguous_start_edges_is_an_error() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a"), node("b")],
      edges: vec![
        edge("e0", "a", Some("start"), "a", "e-in"),
        edge("e1", "b", Some("start"), "b", "e-in"),
      ],
      start_id: None,
    };

    assert!(matches!(Flow::try_from(def), Err(FlowError::AmbiguousStart { count: 2 })));
  }

  #[test]
  fn edge_to_unknown_node_is_an_error() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a")],
      edges: vec![edge("e0", "a", Some("e-out"), "ghost", "e-in")],
      start_id: Some("a".to_string()),
    };

    assert!(matches!(Flow::try_from(def), Err(FlowError::UnknownNode { .. })));
  }

  #[test]
  fn exec_cycle_is_rejected() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a"), node("b")],
      edges: vec![
        edge("e0", "a", Some("start"), "a", "e-in"),
        edge("e1", "a", Some("e-out"), "b", "e-in"),
        edge("e2", "b", Some("e-out"), "a", "e-in"),
      ],
      start_id: None,
    };

    assert!(matches!(Flow::try_from(def), Err(FlowError::ExecCycle(_))));
  }

  #[test]
  fn arg_edges_are_indexed_and_sorted_by_position() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a"), node("b"), node("sum")],
      edges: vec![
        edge("e0", "sum", Some("start"), "sum", "e-in"),
        edge("e1", "b", None, "sum", "1"),
        edge("e2", "a", None, "sum", "0"),
      ],
      start_id: None,
    };

    let flow = Flow::try_from(def).unwrap();
    let args = flow.arg_edges_to("sum");
    assert_eq!(args.len(), 2);
    assert_eq!(args[0].0, 0);
    assert_eq!(args[1].0, 1);
  }

  #[test]
  fn kwarg_edges_are_keyed_by_target() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a"), node("b")],
      edges: vec![
        edge("e0", "b", Some("start"), "b", "e-in"),
        edge("e1", "a", None, "b", "condition"),
      ],
      start_id: None,
    };

    let flow = Flow::try_from(def).unwrap();
    assert_eq!(flow.kwarg_edges_to("b").len(), 1);
    assert_eq!(flow.kwarg_edges_to("b")[0].target_handle, Handle::from("condition"));
  }

  #[test]
  fn exception_edges_carry_target_as_kwarg_injection_hint() {
    let def = FlowDef {
      id: None,
      name: None,
      variables: Map::new(),
      nodes: vec![node("a"), node("handler")],
      edges: vec![
        edge("e0", "a", Some("start"), "a", "e-in"),
        edge("e1", "a", Some("on_error"), "handler", "e-in"),
      ],
      start_id: None,
    };

    let flow = Flow::try_from(def).unwrap();
    let exceptions = flow.exception_edges_from("a");
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].target, "handler");
  }
}
