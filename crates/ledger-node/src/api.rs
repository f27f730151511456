use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ledger_core::{
    peers::parse_peer_address, Block, ChainFetcher, ChainSnapshot, LedgerError, LedgerNode,
    Transaction,
};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::constants::CHAIN_PATH;

pub fn router<F: ChainFetcher>(node: LedgerNode<F>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/mine_block", get(mine_block::<F>))
        .route(CHAIN_PATH, get(get_chain::<F>))
        .route("/is_valid", get(is_valid::<F>))
        .route("/add_transaction", post(add_transaction::<F>))
        .route("/pending_transactions", get(pending_transactions::<F>))
        .route("/connect_node", post(connect_node::<F>))
        .route("/replace_chain", get(replace_chain::<F>))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::MalformedPayload(_) => ApiError::BadRequest(err.to_string()),
            other => {
                error!(error = %other, "ledger operation failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

#[derive(Serialize)]
struct MineResponse {
    message: &'static str,
    #[serde(flatten)]
    block: Block,
}

async fn mine_block<F: ChainFetcher>(
    State(node): State<LedgerNode<F>>,
) -> Result<Json<MineResponse>, ApiError> {
    let block = node.mine().await?;
    Ok(Json(MineResponse {
        message: "Congratulations on mining your block",
        block,
    }))
}

async fn get_chain<F: ChainFetcher>(State(node): State<LedgerNode<F>>) -> Json<ChainSnapshot> {
    Json(node.chain().await)
}

#[derive(Serialize)]
struct ValidResponse {
    message: &'static str,
    valid: bool,
}

async fn is_valid<F: ChainFetcher>(State(node): State<LedgerNode<F>>) -> Json<ValidResponse> {
    let valid = node.is_valid().await;
    let message = if valid { "Chain valid" } else { "Chain Invalid" };
    Json(ValidResponse { message, valid })
}

/// Body of `POST /add_transaction`. Every field is optional at the wire
/// level so a missing one becomes a readable 400 instead of a serde error.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionRequest {
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub amount: Option<Number>,
}

impl TransactionRequest {
    pub fn into_transaction(self) -> Result<Transaction, LedgerError> {
        let present =
            |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        let mut missing = Vec::new();
        if !present(&self.sender) {
            missing.push("sender");
        }
        if !present(&self.receiver) {
            missing.push("receiver");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        match (self.sender, self.receiver, self.amount) {
            (Some(sender), Some(receiver), Some(amount)) if missing.is_empty() => {
                Ok(Transaction::new(sender, receiver, amount))
            }
            _ => Err(LedgerError::MalformedPayload(format!(
                "some elements are missing: {}",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Serialize)]
struct AddTransactionResponse {
    message: String,
    index: u64,
}

async fn add_transaction<F: ChainFetcher>(
    State(node): State<LedgerNode<F>>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AddTransactionResponse>), ApiError> {
    let Json(request) = payload?;
    let tx = request.into_transaction()?;
    let index = node.add_transaction(tx).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddTransactionResponse {
            message: format!("This transaction will be added to the block {index}"),
            index,
        }),
    ))
}

#[derive(Serialize)]
struct PendingResponse {
    size: usize,
    transactions: Vec<Transaction>,
}

async fn pending_transactions<F: ChainFetcher>(
    State(node): State<LedgerNode<F>>,
) -> Json<PendingResponse> {
    let transactions = node.pending().await;
    Json(PendingResponse {
        size: transactions.len(),
        transactions,
    })
}

#[derive(Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    nodes: Vec<String>,
}

#[derive(Serialize)]
struct ConnectResponse {
    message: &'static str,
    total_nodes: Vec<String>,
}

async fn connect_node<F: ChainFetcher>(
    State(node): State<LedgerNode<F>>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConnectResponse>), ApiError> {
    let Json(request) = payload?;
    if request.nodes.is_empty() {
        return Err(ApiError::BadRequest("No Nodes".into()));
    }
    // Reject the whole batch before touching the registry.
    if let Some(err) = request
        .nodes
        .iter()
        .find_map(|address| parse_peer_address(address).err())
    {
        return Err(ApiError::BadRequest(err.to_string()));
    }
    for address in &request.nodes {
        node.add_peer(address)
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    }
    let total_nodes = node.peers().await;
    info!(peers = total_nodes.len(), "connected nodes");
    Ok((
        StatusCode::CREATED,
        Json(ConnectResponse {
            message: "New Nodes are connected",
            total_nodes,
        }),
    ))
}

#[derive(Serialize)]
struct ReplaceResponse {
    message: &'static str,
    replaced: bool,
    chain: Vec<Block>,
}

async fn replace_chain<F: ChainFetcher>(
    State(node): State<LedgerNode<F>>,
) -> Json<ReplaceResponse> {
    let (outcome, snapshot) = node.reconcile().await;
    let message = if outcome.replaced {
        "Chain is successfully replaced"
    } else {
        "Chain is already the largest"
    };
    Json(ReplaceResponse {
        message,
        replaced: outcome.replaced,
        chain: snapshot.chain,
    })
}
