use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::builtin::{arg, BuiltinFn};
use crate::error::RegistryError;

/// Mirrors Python's `operator` module, which the original flows reference
/// directly as node functions (`operator.add`, `operator.eq`, ...) for
/// inline arithmetic and comparisons between upstream values.
pub enum Operator {
  Add,
  Sub,
  Mul,
  TrueDiv,
  Pow,
  Eq,
  And,
  Or,
  Not,
}

fn as_f64(v: &Value, name: &str) -> Result<f64, RegistryError> {
  v.as_f64().ok_or_else(|| RegistryError::CallFailed {
    function: name.to_string(),
    message: format!("expected a number, got {v}"),
  })
}

fn as_bool(v: &Value, name: &str) -> Result<bool, RegistryError> {
  v.as_bool().ok_or_else(|| RegistryError::CallFailed {
    function: name.to_string(),
    message: format!("expected a boolean, got {v}"),
  })
}

#[async_trait]
impl BuiltinFn for Operator {
  async fn call(&self, args: Vec<Value>, _kwargs: Map<String, Value>) -> Result<Value, RegistryError> {
    use Operator::*;
    let name = self.name();

    match self {
      Not => {
        let a = as_bool(&arg(&args, 0, name)?, name)?;
        Ok(Value::Bool(!a))
      }
      Eq => {
        let a = arg(&args, 0, name)?;
        let b = arg(&args, 1, name)?;
        Ok(Value::Bool(a == b))
      }
      And => {
        let a = as_bool(&arg(&args, 0, name)?, name)?;
        let b = as_bool(&arg(&args, 1, name)?, name)?;
        Ok(Value::Bool(a && b))
      }
      Or => {
        let a = as_bool(&arg(&args, 0, name)?, name)?;
        let b = as_bool(&arg(&args, 1, name)?, name)?;
        Ok(Value::Bool(a || b))
      }
      Add | Sub | Mul | TrueDiv | Pow => {
        let a = as_f64(&arg(&args, 0, name)?, name)?;
        let b = as_f64(&arg(&args, 1, name)?, name)?;
        let result = match self {
          Add => a + b,
          Sub => a - b,
          Mul => a * b,
          TrueDiv => {
            if b == 0.0 {
              return Err(RegistryError::CallFailed {
                function: name.to_string(),
                message: "division by zero".to_string(),
              });
            }
            a / b
          }
          Pow => a.powf(b),
          _ => unreachable!(),
        };
        Ok(serde_json::json!(result))
      }
    }
  }
}

impl Operator {
  pub fn name(&self) -> &'static str {
    match self {
      Operator::Add => "operator.add",
      Operator::Sub => "operator.sub",
      Operator::Mul => "operator.mul",
      Operator::TrueDiv => "operator.truediv",
      Operator::Pow => "operator.pow",
      Operator::Eq => "operator.eq",
      Operator::And => "operator.and_",
      Operator::Or => "operator.or_",
      Operator::Not => "operator.not_",
    }
  }

  pub fn by_name(name: &str) -> Option<Self> {
    Some(match name {
      "operator.add" => Operator::Add,
      "operator.sub" => Operator::Sub,
      "operator.mul" => Operator::Mul,
      "operator.truediv" => Operator::TrueDiv,
      "operator.pow" => Operator::Pow,
      "operator.eq" => Operator::Eq,
      "operator.and_" => Operator::And,
      "operator.or_" => Operator::Or,
      "operator.not_" => Operator::Not,
      _ => return None,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[tokio::test]
  async fn add_sums_two_numbers() {
    let result = Operator::Add.call(vec![json!(2), json!(3)], Map::new()).await.unwrap();
    assert_eq!(result, json!(5.0));
  }

  #[tokio::test]
  async fn truediv_by_zero_is_a_call_error() {
    let result = Operator::TrueDiv.call(vec![json!(1), json!(0)], Map::new()).await;
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn eq_compares_raw_json_values() {
    let result = Operator::Eq.call(vec![json!("a"), json!("a")], Map::new()).await.unwrap();
    assert_eq!(result, json!(true));
  }
}
