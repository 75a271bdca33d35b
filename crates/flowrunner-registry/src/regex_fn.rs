use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};

use crate::builtin::{arg, BuiltinFn};
use crate::error::RegistryError;

/// Restores the regex-extraction capability named `REGEXExtractionError` in
/// the original exception list but never wired into its distilled flow, as
/// an ordinary built-in rather than a new error kind — failures surface as
/// an ordinary function-call failure.
pub struct RegexMatch;
pub struct RegexFindAll;

fn compile(pattern: &str, function: &str) -> Result<Regex, RegistryError> {
  Regex::new(pattern).map_err(|e| RegistryError::CallFailed {
    function: function.to_string(),
    message: e.to_string(),
  })
}

fn as_text<'a>(v: &'a Value, function: &str) -> Result<&'a str, RegistryError> {
  v.as_str().ok_or_else(|| RegistryError::CallFailed {
    function: function.to_string(),
    message: format!("expected a string, got {v}"),
  })
}

#[async_trait]
impl BuiltinFn for RegexMatch {
  async fn call(&self, args: Vec<Value>, _kwargs: Map<String, Value>) -> Result<Value, RegistryError> {
    let text = arg(&args, 0, "regex.match")?;
    let pattern = arg(&args, 1, "regex.match")?;
    let re = compile(as_text(&pattern, "regex.match")?, "regex.match")?;

    Ok(match re.find(as_text(&text, "regex.match")?) {
      Some(m) => Value::String(m.as_str().to_string()),
      None => Value::Null,
    })
  }
}

#[async_trait]
impl BuiltinFn for RegexFindAll {
  async fn call(&self, args: Vec<Value>, _kwargs: Map<String, Value>) -> Result<Value, RegistryError> {
    let text = arg(&args, 0, "regex.find_all")?;
    let pattern = arg(&args, 1, "regex.find_all")?;
    let re = compile(as_text(&pattern, "regex.find_all")?, "regex.find_all")?;

    let matches: Vec<Value> = re
      .find_iter(as_text(&text, "regex.find_all")?)
      .map(|m| Value::String(m.as_str().to_string()))
      .collect();

    Ok(Value::Array(matches))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn match_returns_the_first_hit() {
    let result = RegexMatch
      .call(vec![json!("order-42"), json!(r"\d+")], Map::new())
      .await
      .unwrap();
    assert_eq!(result, json!("42"));
  }

  #[tokio::test]
  async fn match_returns_null_on_no_hit() {
    let result = RegexMatch
      .call(vec![json!("no digits here"), json!(r"\d+")], Map::new())
      .await
      .unwrap();
    assert_eq!(result, Value::Null);
  }

  #[tokio::test]
  async fn find_all_collects_every_hit() {
    let result = RegexFindAll
      .call(vec![json!("a1 b2 c3"), json!(r"\d+")], Map::new())
      .await
      .unwrap();
    assert_eq!(result, json!(["1", "2", "3"]));
  }
}
