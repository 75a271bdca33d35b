use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A stored flow definition, keyed by id. `definition` holds the raw
/// `flowrunner_config::FlowDef` payload as JSON rather than a typed column
/// per field — the store doesn't need to understand flow shape, only keep
/// it intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FlowRecord {
  pub id: String,
  pub definition: Json<serde_json::Value>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
