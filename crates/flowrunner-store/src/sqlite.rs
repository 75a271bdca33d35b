use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{Error, FlowRecord, Store};

/// SQLite-backed store. Callers are responsible for running migrations
/// (`migrate`) before handing the pool to anything that reads or writes.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await
  }
}

#[async_trait]
impl Store for SqliteStore {
  async fn create_flow(&self, flow: FlowRecord) -> Result<(), Error> {
    sqlx::query(
      r#"
      INSERT INTO flows (id, definition, created_at, updated_at)
      VALUES (?, ?, ?, ?)
      "#,
    )
    .bind(&flow.id)
    .bind(&flow.definition)
    .bind(flow.created_at)
    .bind(flow.updated_at)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn read_flow(&self, id: &str) -> Result<FlowRecord, Error> {
    sqlx::query_as(
      r#"
      SELECT id, definition, created_at, updated_at
      FROM flows
      WHERE id = ?
      "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| Error::NotFound(id.to_string()))
  }

  async fn update_flow(&self, flow: FlowRecord) -> Result<(), Error> {
    let result = sqlx::query(
      r#"
      UPDATE flows
      SET definition = ?, updated_at = ?
      WHERE id = ?
      "#,
    )
    .bind(&flow.definition)
    .bind(flow.updated_at)
    .bind(&flow.id)
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(flow.id));
    }
    Ok(())
  }

  async fn delete_flow(&self, id: &str) -> Result<(), Error> {
    let result = sqlx::query("DELETE FROM flows WHERE id = ?").bind(id).execute(&self.pool).await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(id.to_string()));
    }
    Ok(())
  }

  async fn list_flows(&self) -> Result<Vec<FlowRecord>, Error> {
    let flows = sqlx::query_as(
      r#"
      SELECT id, definition, created_at, updated_at
      FROM flows
      ORDER BY created_at DESC
      "#,
    )
    .fetch_all(&self.pool)
    .await?;

    Ok(flows)
  }
}
