use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A function invocation site as it arrives on the wire.
///
/// `node_type` is a cosmetic tag carried through for UI purposes only — the
/// engine never branches on it. `function` is null for pure literal holders
/// (a node whose only purpose is to expose a constant via `args`/`kwargs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  #[serde(rename = "type", default)]
  pub node_type: String,
  #[serde(default)]
  pub function: Option<String>,
  #[serde(default, deserialize_with = "deserialize_args")]
  pub args: Option<Vec<Value>>,
  #[serde(default, deserialize_with = "deserialize_kwargs")]
  pub kwargs: Option<Map<String, Value>>,
  /// Set by the interpreter's `get_node` from the outgoing exec edge, not by
  /// the wire payload. `branch` mutates this at runtime to steer the chain.
  #[serde(default)]
  pub next_function: Option<String>,
}

/// Flatten `[{k: v}, ...]` to `[v, ...]`.
/// Anything already shaped like a plain array of values passes through.
fn deserialize_args<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
  Ok(raw.map(|items| {
    items
      .into_iter()
      .map(|item| match item {
        Value::Object(map) => map.into_values().next().unwrap_or(Value::Null),
        other => other,
      })
      .collect()
  }))
}

/// Flatten `[{k: v}, ...]` to `{k: v, ...}`.
/// A payload that is already an object passes through unchanged.
fn deserialize_kwargs<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<Value> = Option::deserialize(deserializer)?;
  Ok(raw.map(|value| match value {
    Value::Array(items) => {
      let mut merged = Map::new();
      for item in items {
        if let Value::Object(map) = item {
          merged.extend(map);
        }
      }
      merged
    }
    Value::Object(map) => map,
    _ => Map::new(),
  }))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn flattens_args_given_as_list_of_single_key_maps() {
    let node: Node = serde_json::from_value(json!({
      "id": "n1",
      "type": "component",
      "function": "operator.add",
      "args": [{"a": 1}, {"b": 2}]
    }))
    .unwrap();

    assert_eq!(node.args, Some(vec![json!(1), json!(2)]));
  }

  #[test]
  fn leaves_plain_args_list_unchanged() {
    let node: Node = serde_json::from_value(json!({
      "id": "n1",
      "type": "component",
      "args": [1, 2]
    }))
    .unwrap();

    assert_eq!(node.args, Some(vec![json!(1), json!(2)]));
  }

  #[test]
  fn flattens_kwargs_given_as_list_of_maps() {
    let node: Node = serde_json::from_value(json!({
      "id": "n1",
      "type": "component",
      "kwargs": [{"x": 1}, {"y": 2}]
    }))
    .unwrap();

    let mut expected = Map::new();
    expected.insert("x".to_string(), json!(1));
    expected.insert("y".to_string(), json!(2));
    assert_eq!(node.kwargs, Some(expected));
  }

  #[test]
  fn leaves_plain_kwargs_object_unchanged() {
    let node: Node = serde_json::from_value(json!({
      "id": "n1",
      "type": "component",
      "kwargs": {"x": 1}
    }))
    .unwrap();

    let mut expected = Map::new();
    expected.insert("x".to_string(), json!(1));
    assert_eq!(node.kwargs, Some(expected));
  }
}
