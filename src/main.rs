mod http;

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flowrunner_config::FlowDef;
use flowrunner_driver::Supervisor;
use flowrunner_registry::FunctionRegistry;
use flowrunner_store::{InMemoryStore, SqliteStore, Store};
use sqlx::sqlite::SqlitePoolOptions;

/// flowrunner - a chain-driven flow interpreter
#[derive(Parser)]
#[command(name = "flowrunner")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.flowrunner)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a single flow to completion, reading its payload variables from stdin
  Run {
    /// Path to the flow file (JSON)
    flow_file: PathBuf,
  },

  /// Serve the HTTP/WebSocket API
  Serve {
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// SQLite database URL for flow storage (defaults to an in-memory store)
    #[arg(long)]
    database_url: Option<String>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let cli = Cli::parse();
  let data_dir = cli.data_dir.unwrap_or_else(|| dirs::home_dir().expect("could not determine home directory").join(".flowrunner"));

  let rt = tokio::runtime::Runtime::new()?;
  match cli.command {
    Some(Commands::Run { flow_file }) => rt.block_on(run_script(flow_file)),
    Some(Commands::Serve { addr, database_url }) => rt.block_on(serve(addr, database_url, data_dir)),
    None => {
      println!("flowrunner - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run_script(flow_file: PathBuf) -> Result<()> {
  let content = tokio::fs::read_to_string(&flow_file).await.with_context(|| format!("failed to read flow file: {}", flow_file.display()))?;
  let mut def: FlowDef = serde_json::from_str(&content).with_context(|| format!("failed to parse flow file: {}", flow_file.display()))?;

  let payload = read_payload_from_stdin()?;
  if let serde_json::Value::Object(map) = payload {
    def.variables.extend(map);
  }

  let variables = flowrunner_driver::run_to_completion(def, FunctionRegistry::new(), Arc::new(flowrunner_interpreter::NoopNotifier))
    .await
    .context("flow run failed")?;

  println!("{}", serde_json::to_string_pretty(&variables)?);
  Ok(())
}

async fn serve(addr: String, database_url: Option<String>, data_dir: PathBuf) -> Result<()> {
  let store: Arc<dyn Store> = match database_url {
    Some(url) => {
      let pool = SqlitePoolOptions::new().connect(&url).await.with_context(|| format!("failed to connect to {url}"))?;
      let store = SqliteStore::new(pool);
      store.migrate().await.context("failed to run migrations")?;
      Arc::new(store)
    }
    None => {
      tokio::fs::create_dir_all(&data_dir).await.ok();
      Arc::new(InMemoryStore::new())
    }
  };

  let supervisor = Arc::new(Supervisor::new(FunctionRegistry::new()));
  let state = http::AppState { store, supervisor };

  let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
  tracing::info!(%addr, "flowrunner serving");
  axum::serve(listener, http::router(state)).await.context("server error")?;
  Ok(())
}

fn read_payload_from_stdin() -> Result<serde_json::Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(serde_json::json!({}));
  }

  let mut input = String::new();
  io::stdin().read_to_string(&mut input).context("failed to read payload from stdin")?;

  if input.trim().is_empty() {
    Ok(serde_json::json!({}))
  } else {
    serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
  }
}
