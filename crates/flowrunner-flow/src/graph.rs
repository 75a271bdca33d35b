use std::collections::{HashMap, HashSet};

/// Read-only view over the exec-chain adjacency of a flow, for diagnostics
/// and tooling. The interpreter does not walk this structure to decide what
/// runs next — it follows `Flow::next_of` one id at a time — but callers
/// (a `dump` command, a visualizer) want entry points and join points
/// without re-deriving them from the edge list.
#[derive(Debug, Clone)]
pub struct Graph {
  adjacency: HashMap<String, Vec<String>>,
  reverse_adjacency: HashMap<String, Vec<String>>,
  entry_points: Vec<String>,
  join_points: HashSet<String>,
}

impl Graph {
  pub fn new(node_ids: impl IntoIterator<Item = String>, edges: &[(String, String)]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for id in node_ids {
      adjacency.entry(id.clone()).or_default();
      reverse_adjacency.entry(id).or_default();
    }

    for (from, to) in edges {
      adjacency.entry(from.clone()).or_default().push(to.clone());
      reverse_adjacency
        .entry(to.clone())
        .or_default()
        .push(from.clone());
    }

    let entry_points: Vec<String> = adjacency
      .keys()
      .filter(|id| reverse_adjacency.get(*id).is_none_or(|v| v.is_empty()))
      .cloned()
      .collect();

    let join_points: HashSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(id, _)| id.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    }
  }

  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  pub fn downstream(&self, node_id: &str) -> &[String] {
    self.adjacency.get(node_id).map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn is_join_point(&self, node_id: &str) -> bool {
    self.join_points.contains(node_id)
  }

  pub fn join_points(&self) -> &HashSet<String> {
    &self.join_points
  }
}

/// DFS cycle check with 3-colour marking: white (unvisited), gray (on the
/// current path), black (finished). A gray node reached again is a back
/// edge. Used only on the exec-edge subgraph — arg/kwarg dependency cycles
/// are left to memoisation at runtime.
pub fn has_cycle(node_ids: &HashSet<String>, edges: &[(String, String)]) -> bool {
  let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
  for id in node_ids {
    adjacency.insert(id.as_str(), Vec::new());
  }
  for (from, to) in edges {
    if let Some(neighbors) = adjacency.get_mut(from.as_str()) {
      neighbors.push(to.as_str());
    }
  }

  let mut color: HashMap<&str, u8> = node_ids.iter().map(|id| (id.as_str(), 0u8)).collect();

  fn dfs<'a>(node: &'a str, adjacency: &HashMap<&str, Vec<&'a str>>, color: &mut HashMap<&'a str, u8>) -> bool {
    color.insert(node, 1);
    if let Some(neighbors) = adjacency.get(node) {
      for &neighbor in neighbors {
        match color.get(neighbor) {
          Some(1) => return true,
          Some(0) => {
            if dfs(neighbor, adjacency, color) {
              return true;
            }
          }
          _ => {}
        }
      }
    }
    color.insert(node, 2);
    false
  }

  for id in node_ids {
    if color.get(id.as_str()) == Some(&0) && dfs(id.as_str(), &adjacency, &mut color) {
      return true;
    }
  }

  false
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ids(names: &[&str]) -> HashSet<String> {
    names.iter().map(|s| s.to_string()).collect()
  }

  fn edges(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
  }

  #[test]
  fn acyclic_chain_has_no_cycle() {
    assert!(!has_cycle(&ids(&["a", "b", "c"]), &edges(&[("a", "b"), ("b", "c")])));
  }

  #[test]
  fn self_loop_is_a_cycle() {
    assert!(has_cycle(&ids(&["a"]), &edges(&[("a", "a")])));
  }

  #[test]
  fn back_edge_is_a_cycle() {
    assert!(has_cycle(&ids(&["a", "b", "c"]), &edges(&[("a", "b"), ("b", "c"), ("c", "a")])));
  }

  #[test]
  fn entry_points_have_no_incoming_edges() {
    let graph = Graph::new(["a", "b", "c"].map(String::from), &edges(&[("a", "b"), ("a", "c")]));
    assert_eq!(graph.entry_points(), &["a".to_string()]);
  }

  #[test]
  fn join_point_has_multiple_incoming_edges() {
    let graph = Graph::new(["a", "b", "c"].map(String::from), &edges(&[("a", "c"), ("b", "c")]));
    assert!(graph.is_join_point("c"));
    assert!(!graph.is_join_point("a"));
  }
}
