//! Flowrunner Store
//!
//! Storage trait and implementations for flow definitions: create, read,
//! update, delete, list. The `Store` trait is implemented twice — an
//! in-memory map for tests and single-process use, and a SQLite-backed
//! store for anything that needs to survive a restart.

mod memory;
mod sqlite;
mod types;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use types::FlowRecord;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("no flow with id {0}")]
  NotFound(String),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
  async fn create_flow(&self, flow: FlowRecord) -> Result<(), Error>;
  async fn read_flow(&self, id: &str) -> Result<FlowRecord, Error>;
  async fn update_flow(&self, flow: FlowRecord) -> Result<(), Error>;
  async fn delete_flow(&self, id: &str) -> Result<(), Error>;
  async fn list_flows(&self) -> Result<Vec<FlowRecord>, Error>;
}
