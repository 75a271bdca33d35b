use flowrunner_config::{Edge, Handle};

/// The role an edge plays in the graph, determined deterministically from
/// its handle pair. No edge is ambiguous: exactly one role applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeRole {
  Start,
  Exec,
  Exception,
  Arg,
  Kwarg,
}

pub fn classify(edge: &Edge) -> EdgeRole {
  let source_tag = edge.source_handle.as_ref().and_then(Handle::as_str);

  if source_tag == Some("start") {
    return EdgeRole::Start;
  }

  if edge.target_handle.as_str() == Some("e-in") {
    return if source_tag == Some("e-out") {
      EdgeRole::Exec
    } else {
      EdgeRole::Exception
    };
  }

  if edge.target_handle.is_numeric() {
    EdgeRole::Arg
  } else {
    EdgeRole::Kwarg
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn edge(source_handle: Option<&str>, target_handle: &str) -> Edge {
    Edge {
      id: "e".to_string(),
      source: "a".to_string(),
      source_handle: source_handle.map(Handle::from),
      target: "b".to_string(),
      target_handle: Handle::from(target_handle),
    }
  }

  #[test]
  fn start_edge_takes_priority() {
    assert_eq!(classify(&edge(Some("start"), "e-in")), EdgeRole::Start);
  }

  #[test]
  fn exec_edge_is_e_out_to_e_in() {
    assert_eq!(classify(&edge(Some("e-out"), "e-in")), EdgeRole::Exec);
  }

  #[test]
  fn exception_edge_is_anything_else_into_e_in() {
    assert_eq!(classify(&edge(Some("on-error"), "e-in")), EdgeRole::Exception);
    assert_eq!(classify(&edge(None, "e-in")), EdgeRole::Exception);
  }

  #[test]
  fn arg_edge_has_numeric_target_handle() {
    assert_eq!(classify(&edge(Some("anything"), "0")), EdgeRole::Arg);
    assert_eq!(classify(&edge(None, "1")), EdgeRole::Arg);
  }

  #[test]
  fn kwarg_edge_is_non_numeric_non_e_in() {
    assert_eq!(classify(&edge(None, "condition")), EdgeRole::Kwarg);
  }
}
