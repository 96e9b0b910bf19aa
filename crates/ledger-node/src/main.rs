use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use ledger_core::{
    Ledger, LedgerConfig, LedgerError, MiningStrategy, SealedBlock, SharedLedger, Transaction,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{net::SocketAddr, path::PathBuf};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[derive(Parser, Debug)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Optional TOML file with `difficulty` and `strategy`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Leading zero hex characters required of a mined block hash
    #[arg(long)]
    difficulty: Option<u32>,

    /// Search nonces on all cores
    #[arg(long)]
    parallel: bool,
}

impl Args {
    fn ledger_config(&self) -> anyhow::Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                LedgerConfig::from_toml(&text)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => LedgerConfig::default(),
        };
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if self.parallel {
            config.strategy = MiningStrategy::Parallel;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone)]
struct AppState {
    ledger: SharedLedger,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct Head {
    height: u64,
    hash: String,
}

#[derive(Serialize)]
struct ChainView {
    length: usize,
    chain: Vec<SealedBlock>,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = match err {
            LedgerError::EmptyPendingSet
            | LedgerError::IndexMismatch { .. }
            | LedgerError::LinkageMismatch { .. }
            | LedgerError::ProofInvalid { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

async fn submit_tx(
    State(state): State<AppState>,
    Json(record): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let pending = state.ledger.add_new_transaction(Transaction::from(record))?;
    Ok(Json(json!({ "accepted": true, "pending": pending })))
}

async fn mine(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let ledger = state.ledger.clone();
    let index = tokio::task::spawn_blocking(move || ledger.mine())
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("mining task failed: {e}"),
        })??;
    info!("mined block {index}");
    Ok(Json(json!({ "index": index })))
}

async fn chain(State(state): State<AppState>) -> Result<Json<ChainView>, ApiError> {
    let chain = state.ledger.chain()?;
    Ok(Json(ChainView {
        length: chain.len(),
        chain,
    }))
}

async fn head(State(state): State<AppState>) -> Result<Json<Head>, ApiError> {
    let tip = state.ledger.tip()?;
    Ok(Json(Head {
        height: tip.index(),
        hash: tip.hash().to_string(),
    }))
}

async fn valid(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let valid = state.ledger.check_chain_validity()?;
    Ok(Json(json!({ "valid": valid })))
}

async fn pending(State(state): State<AppState>) -> Result<Json<Vec<Transaction>>, ApiError> {
    Ok(Json(state.ledger.pending()?))
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .route("/healthz", get(|| async { Json(Health { status: "ok" }) }))
        .route("/tx", post(submit_tx))
        .route("/mine", post(mine))
        .route("/pending", get(pending))
        .route("/chain", get(chain))
        .route("/chain/head", get(head))
        .route("/chain/valid", get(valid))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = args.ledger_config()?;
    info!(
        difficulty = config.difficulty,
        strategy = ?config.strategy,
        "starting ledger"
    );
    let state = AppState {
        ledger: SharedLedger::new(Ledger::with_config(&config)),
    };

    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app(state)).await?;
    Ok(())
}
