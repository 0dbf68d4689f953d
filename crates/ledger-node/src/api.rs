use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use ledger_core::{Block, CancelFlag, Ledger, LedgerError};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub mine_timeout: Duration,
}

impl AppState {
    pub fn new(ledger: Arc<Ledger>, mine_timeout: Duration) -> Self {
        Self {
            ledger,
            mine_timeout,
        }
    }
}

/// Body of a write request.
#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(rename = "BPM", alias = "bpm")]
    pub bpm: i64,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("mining did not finish within {0:?}")]
    Timeout(Duration),

    #[error("mining worker failed: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(LedgerError::MiningCancelled { .. }) | ApiError::Timeout(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Ledger(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, err = %self, "write request failed");
        } else {
            warn!(%status, err = %self, "write request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        pretty_json(status, &body)
    }
}

/// Indented JSON, matching what the chain endpoint has always returned.
fn pretty_json<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_string_pretty(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("HTTP 500: Internal Server Error: {err}"),
        )
            .into_response(),
    }
}

/// Trips the flag when the request future goes away, finished or not.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_chain).post(write_block))
        .route("/health", get(|| async { Json(Health { status: "ok" }) }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_chain(State(state): State<AppState>) -> Response {
    pretty_json(StatusCode::OK, &state.ledger.chain())
}

async fn write_block(
    State(state): State<AppState>,
    body: Result<Json<Message>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(message) =
        body.map_err(|rejection| ApiError::MalformedRequest(rejection.body_text()))?;

    let cancel = CancelFlag::new();
    let _guard = CancelOnDrop(cancel.clone());
    let ledger = Arc::clone(&state.ledger);
    let worker = tokio::task::spawn_blocking(move || ledger.submit_payload(message.bpm, &cancel));

    let block: Block = match tokio::time::timeout(state.mine_timeout, worker).await {
        Ok(joined) => joined.map_err(|err| ApiError::Internal(err.to_string()))??,
        Err(_) => return Err(ApiError::Timeout(state.mine_timeout)),
    };

    info!(index = block.index, nonce = block.nonce, "block accepted");
    Ok(pretty_json(StatusCode::CREATED, &block))
}
