use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::builtin::{arg, BuiltinFn};
use crate::error::RegistryError;

/// Shared by the `extract_json` control-flow primitive and the `json.extract`
/// built-in: run a JSONPath expression against an object and collapse a
/// single match down to its bare value, since most flows extract one field
/// at a time and don't want to unwrap a one-element array every time.
pub fn extract_json(json_obj: &Value, expression: &str) -> Result<Value, RegistryError> {
  if !json_obj.is_object() {
    return Err(RegistryError::CallFailed {
      function: "json.extract".to_string(),
      message: "expected a JSON object".to_string(),
    });
  }

  let matches = jsonpath_lib::select(json_obj, expression).map_err(|e| RegistryError::CallFailed {
    function: "json.extract".to_string(),
    message: e.to_string(),
  })?;

  match matches.len() {
    0 => Ok(Value::Null),
    1 => Ok(matches[0].clone()),
    _ => Ok(Value::Array(matches.into_iter().cloned().collect())),
  }
}

/// The registry entry form of `extract_json`, callable by name like any
/// other built-in instead of only through the `extract_json` control-flow
/// primitive.
pub struct JsonExtract;

#[async_trait]
impl BuiltinFn for JsonExtract {
  async fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, RegistryError> {
    let json_obj = kwargs.get("json_obj").cloned().map(Ok).unwrap_or_else(|| arg(&args, 0, "json.extract"))?;
    let expression = kwargs.get("expression").cloned().map(Ok).unwrap_or_else(|| arg(&args, 1, "json.extract"))?;

    let expression = expression.as_str().ok_or_else(|| RegistryError::CallFailed {
      function: "json.extract".to_string(),
      message: format!("expected a string expression, got {expression}"),
    })?;

    extract_json(&json_obj, expression)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn single_match_is_unwrapped() {
    let obj = json!({"a": {"b": 1}});
    assert_eq!(extract_json(&obj, "$.a.b").unwrap(), json!(1));
  }

  #[test]
  fn multiple_matches_stay_an_array() {
    let obj = json!({"items": [{"x": 1}, {"x": 2}]});
    assert_eq!(extract_json(&obj, "$.items[*].x").unwrap(), json!([1, 2]));
  }

  #[test]
  fn non_object_input_is_rejected() {
    assert!(extract_json(&json!([1, 2]), "$.a").is_err());
  }

  #[tokio::test]
  async fn json_extract_builtin_reads_positional_or_keyword_args() {
    let obj = json!({"a": {"b": 1}});

    let positional = JsonExtract.call(vec![obj.clone(), json!("$.a.b")], Map::new()).await.unwrap();
    assert_eq!(positional, json!(1));

    let mut kwargs = Map::new();
    kwargs.insert("json_obj".to_string(), obj);
    kwargs.insert("expression".to_string(), json!("$.a.b"));
    let keyword = JsonExtract.call(vec![], kwargs).await.unwrap();
    assert_eq!(keyword, json!(1));
  }
}
