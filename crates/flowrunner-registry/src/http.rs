use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::builtin::{arg, BuiltinFn};
use crate::error::RegistryError;

/// `http.get`/`http.post`, normalized the same way the interpreter
/// normalizes any function that happens to return an HTTP response object:
/// status, headers, and a body that's parsed as JSON when the response
/// declares a JSON content type, falling back to plain text otherwise.
pub struct HttpGet;
pub struct HttpPost;

async fn to_normalized_value(response: reqwest::Response) -> Result<Value, RegistryError> {
  let status = response.status().as_u16();
  let is_json = response
    .headers()
    .get(reqwest::header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.contains("application/json"))
    .unwrap_or(false);

  let headers: Map<String, Value> = response
    .headers()
    .iter()
    .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), Value::String(v.to_string()))))
    .collect();

  let body = if is_json {
    response.json::<Value>().await.map_err(|e| RegistryError::CallFailed {
      function: "http".to_string(),
      message: e.to_string(),
    })?
  } else {
    Value::String(response.text().await.map_err(|e| RegistryError::CallFailed {
      function: "http".to_string(),
      message: e.to_string(),
    })?)
  };

  Ok(serde_json::json!({ "status": status, "headers": headers, "body": body }))
}

fn as_url<'a>(v: &'a Value, function: &str) -> Result<&'a str, RegistryError> {
  v.as_str().ok_or_else(|| RegistryError::CallFailed {
    function: function.to_string(),
    message: format!("expected a URL string, got {v}"),
  })
}

#[async_trait]
impl BuiltinFn for HttpGet {
  async fn call(&self, args: Vec<Value>, _kwargs: Map<String, Value>) -> Result<Value, RegistryError> {
    let url = arg(&args, 0, "http.get")?;
    let response = reqwest::get(as_url(&url, "http.get")?).await.map_err(|e| RegistryError::CallFailed {
      function: "http.get".to_string(),
      message: e.to_string(),
    })?;
    to_normalized_value(response).await
  }
}

#[async_trait]
impl BuiltinFn for HttpPost {
  async fn call(&self, args: Vec<Value>, kwargs: Map<String, Value>) -> Result<Value, RegistryError> {
    let url = arg(&args, 0, "http.post")?;
    let body = kwargs.get("json").cloned().or_else(|| args.get(1).cloned()).unwrap_or(Value::Null);

    let client = reqwest::Client::new();
    let response = client
      .post(as_url(&url, "http.post")?)
      .json(&body)
      .send()
      .await
      .map_err(|e| RegistryError::CallFailed {
        function: "http.post".to_string(),
        message: e.to_string(),
      })?;
    to_normalized_value(response).await
  }
}
