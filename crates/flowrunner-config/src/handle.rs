use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An edge handle value. Handles are either a role tag like `"start"`/`"e-out"`,
/// a keyword name, or a positional index — the wire format mixes strings and
/// integers freely, so this carries both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handle {
  Str(String),
  Int(i64),
}

impl Handle {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Handle::Str(s) => Some(s),
      Handle::Int(_) => None,
    }
  }

  /// Parse this handle as a positional argument index, accepting either a
  /// native integer or a digit-only string (the wire format allows both).
  pub fn as_index(&self) -> Option<usize> {
    match self {
      Handle::Int(i) if *i >= 0 => Some(*i as usize),
      Handle::Str(s) => s.parse().ok(),
      _ => None,
    }
  }

  pub fn is_numeric(&self) -> bool {
    self.as_index().is_some()
  }
}

impl fmt::Display for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Handle::Str(s) => write!(f, "{s}"),
      Handle::Int(i) => write!(f, "{i}"),
    }
  }
}

impl From<&str> for Handle {
  fn from(s: &str) -> Self {
    Handle::Str(s.to_string())
  }
}

impl<'de> Deserialize<'de> for Handle {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Int(i64),
      Str(String),
    }

    match Raw::deserialize(deserializer)? {
      Raw::Int(i) => Ok(Handle::Int(i)),
      Raw::Str(s) => Ok(Handle::Str(s)),
    }
  }
}

impl Serialize for Handle {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    match self {
      Handle::Str(s) => serializer.serialize_str(s),
      Handle::Int(i) => serializer.serialize_i64(*i),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn numeric_string_is_an_index() {
    let h = Handle::Str("2".to_string());
    assert_eq!(h.as_index(), Some(2));
  }

  #[test]
  fn keyword_handle_is_not_an_index() {
    let h = Handle::Str("e-in".to_string());
    assert_eq!(h.as_index(), None);
  }

  #[test]
  fn native_int_is_an_index() {
    assert_eq!(Handle::Int(3).as_index(), Some(3));
  }
}
