// deployer/src/server.rs
//! `GET /swapInfo`: tells front-ends where the router lives and how to call it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use ethers::types::Address;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

pub const SWAP_FUNCTION_SIGNATURE: &str =
    "function swap(address fromToken, address toToken, uint256 amount) external";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    pub swap_address: String,
    pub swap_abi: Vec<String>,
}

#[derive(Debug)]
pub enum ServerError {
    Internal(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal(msg) => write!(f, "internal_error: {msg}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };
        let body = json!({ "success": false, "error": message });
        (status, Json(body)).into_response()
    }
}

pub fn router(config: ServerConfig) -> Router {
    Router::new()
        .route("/swapInfo", get(swap_info))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(config))
}

/// An unset address is served as `""`; a set but unparsable one is a 500.
pub async fn swap_info(
    State(config): State<Arc<ServerConfig>>,
) -> Result<Json<SwapInfo>, ServerError> {
    let swap_address = match config.swap_address.as_deref() {
        None => {
            warn!("SWAP_ADDRESS is not configured; serving an empty swap address");
            String::new()
        }
        Some(raw) => {
            raw.parse::<Address>().map_err(|e| {
                error!(address = %raw, error = %e, "Configured swap address is invalid");
                ServerError::Internal(format!("configured swap address {raw:?} is invalid: {e}"))
            })?;
            raw.to_string()
        }
    };

    Ok(Json(SwapInfo { swap_address, swap_abi: vec![SWAP_FUNCTION_SIGNATURE.to_string()] }))
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.port)
        .parse()
        .wrap_err_with(|| format!("invalid bind address {}:{}", config.bind_addr, config.port))?;

    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!("backend running on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("HTTP server stopped with an error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
