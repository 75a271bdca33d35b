//! HTTP and WebSocket surface: flow CRUD, a fire-and-forget run trigger,
//! and a WebSocket that narrates one run's lifecycle the way the original
//! `/ws/run` connection did — `"Starting process."`,
//! `"Stopping process per user request."`, `"Process completed."`,
//! `"Process already running. Ignoring new process request."`,
//! `"No process running."`.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use flowrunner_config::FlowDef;
use flowrunner_driver::Supervisor;
use flowrunner_interpreter::{ChannelNotifier, NoopNotifier, Update};
use flowrunner_store::{FlowRecord, Store};
use serde_json::Value;
use sqlx::types::Json as SqlxJson;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub supervisor: Arc<Supervisor>,
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/api/flow", get(list_flows).post(create_flow))
    .route("/api/flow/{id}", get(read_flow).put(update_flow).delete(delete_flow))
    .route("/api/run", post(run_once))
    .route("/ws/run", get(ws_run))
    .with_state(state)
}

async fn list_flows(State(state): State<AppState>) -> Result<Json<Vec<FlowRecord>>, ApiError> {
  Ok(Json(state.store.list_flows().await?))
}

async fn create_flow(State(state): State<AppState>, Json(def): Json<FlowDef>) -> Result<Json<FlowRecord>, ApiError> {
  let id = def.id.clone().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
  let now = Utc::now();
  let record = FlowRecord {
    id,
    definition: SqlxJson(serde_json::to_value(&def).expect("FlowDef always serializes")),
    created_at: now,
    updated_at: now,
  };
  state.store.create_flow(record.clone()).await?;
  Ok(Json(record))
}

async fn read_flow(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<FlowRecord>, ApiError> {
  Ok(Json(state.store.read_flow(&id).await?))
}

async fn update_flow(State(state): State<AppState>, Path(id): Path<String>, Json(def): Json<FlowDef>) -> Result<Json<FlowRecord>, ApiError> {
  let existing = state.store.read_flow(&id).await?;
  let record = FlowRecord {
    id,
    definition: SqlxJson(serde_json::to_value(&def).expect("FlowDef always serializes")),
    created_at: existing.created_at,
    updated_at: Utc::now(),
  };
  state.store.update_flow(record.clone()).await?;
  Ok(Json(record))
}

async fn delete_flow(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
  state.store.delete_flow(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// Resolves `flow_id` against the store if given, otherwise requires the
/// body to already be a full flow, then fires the run without waiting for
/// it to finish.
async fn run_once(State(state): State<AppState>, Json(body): Json<Value>) -> Result<&'static str, ApiError> {
  let def: FlowDef = if let Some(flow_id) = body.get("flow_id").and_then(Value::as_str) {
    let record = state.store.read_flow(flow_id).await?;
    serde_json::from_value(record.definition.0).map_err(|e| ApiError::BadRequest(e.to_string()))?
  } else {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(e.to_string()))?
  };

  state.supervisor.start(def, Arc::new(NoopNotifier)).await;
  Ok("Started process.")
}

async fn ws_run(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
  ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let Some(Ok(message)) = incoming else { break };
        let Message::Text(text) = message else { continue };

        let Ok(data) = serde_json::from_str::<Value>(&text) else {
          let _ = socket.send(Message::Text("Invalid flow data: not valid JSON".into())).await;
          continue;
        };

        if data.get("stop").is_some() {
          let narration = state.supervisor.stop().await;
          if socket.send(Message::Text(narration.into())).await.is_err() {
            break;
          }
          continue;
        }

        match serde_json::from_value::<FlowDef>(data) {
          Ok(def) => {
            let (notifier, mut updates) = ChannelNotifier::new();
            let narration = state.supervisor.start(def, Arc::new(notifier)).await;
            if socket.send(Message::Text(narration.into())).await.is_err() {
              break;
            }

            while let Some(update) = updates.recv().await {
              let payload = match &update {
                Update::Lifecycle(text) => text.clone(),
                Update::NodeCompleted { .. } => serde_json::to_string(&update).unwrap_or_default(),
              };
              if socket.send(Message::Text(payload.into())).await.is_err() {
                break;
              }
            }
          }
          Err(e) => {
            if socket.send(Message::Text(format!("Invalid flow data: {e}").into())).await.is_err() {
              break;
            }
          }
        }
      }
    }
  }
}

enum ApiError {
  NotFound(String),
  BadRequest(String),
  Internal(String),
}

impl From<flowrunner_store::Error> for ApiError {
  fn from(e: flowrunner_store::Error) -> Self {
    match e {
      flowrunner_store::Error::NotFound(id) => ApiError::NotFound(id),
      flowrunner_store::Error::Database(e) => ApiError::Internal(e.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(id) => (StatusCode::NOT_FOUND, format!("no flow with id {id}")),
      ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
      ApiError::Internal(message) => {
        warn!(error = %message, "internal error serving flow request");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
      }
    };
    (status, message).into_response()
  }
}
