use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{Error, FlowRecord, Store};

/// In-process store, for tests and for running without a database
/// configured. `read_flow` looks the id up directly in the map — the
/// original in-memory store this is grounded on had a copy-paste bug
/// that read from an undefined variable instead of its own field, always
/// returning `None`; that bug has no business surviving the port.
#[derive(Default)]
pub struct InMemoryStore {
  flows: Mutex<HashMap<String, FlowRecord>>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Store for InMemoryStore {
  async fn create_flow(&self, flow: FlowRecord) -> Result<(), Error> {
    self.flows.lock().await.insert(flow.id.clone(), flow);
    Ok(())
  }

  async fn read_flow(&self, id: &str) -> Result<FlowRecord, Error> {
    self.flows.lock().await.get(id).cloned().ok_or_else(|| Error::NotFound(id.to_string()))
  }

  async fn update_flow(&self, flow: FlowRecord) -> Result<(), Error> {
    let mut flows = self.flows.lock().await;
    if !flows.contains_key(&flow.id) {
      return Err(Error::NotFound(flow.id));
    }
    flows.insert(flow.id.clone(), flow);
    Ok(())
  }

  async fn delete_flow(&self, id: &str) -> Result<(), Error> {
    self.flows.lock().await.remove(id).map(|_| ()).ok_or_else(|| Error::NotFound(id.to_string()))
  }

  async fn list_flows(&self) -> Result<Vec<FlowRecord>, Error> {
    Ok(self.flows.lock().await.values().cloned().collect())
  }
}
