use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::render::Reply;
use crate::types::SourceHealth;
use crate::AppState;

/// Message relayed from the chat platform
#[derive(Debug, serde::Deserialize)]
pub struct CommandRequest {
    pub content: String,
    #[serde(default)]
    pub author_is_bot: bool,
}

/// POST /commands - Answer one chat message
///
/// 200 with the reply, or 204 when the message is not a command for this bot.
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Response {
    match state
        .dispatcher
        .handle_message(&req.content, req.author_is_bot)
        .await
    {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// GET /assets - Supported assets and their aliases
pub async fn list_assets(State(state): State<Arc<AppState>>) -> Json<AssetsResponse> {
    let registry = state.dispatcher.registry();

    Json(AssetsResponse {
        assets: registry
            .assets()
            .iter()
            .map(|a| AssetEntry {
                id: a.id.clone(),
                name: a.name.clone(),
                aliases: a.aliases.clone(),
            })
            .collect(),
    })
}

/// POST /broadcast - Build and post the daily summary now
pub async fn trigger_broadcast(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BroadcastResponse>, (StatusCode, String)> {
    info!("Manual daily summary requested");

    match state.dispatcher.daily_summary().await {
        Ok(reply) => {
            if let Err(e) = state.gateway.post(&reply).await {
                warn!("Broadcast delivery failed: {}", e);
                return Err((StatusCode::BAD_GATEWAY, e.to_string()));
            }
            Ok(Json(BroadcastResponse {
                gateway: state.gateway.name().to_string(),
                reply,
            }))
        }
        Err(e) => {
            warn!("Daily summary failed: {}", e);
            Err((StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// GET /health - Service health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let source = state.dispatcher.source().health().await;

    Json(HealthResponse {
        status: if source.is_healthy {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        sources: vec![source],
    })
}

// Response types
#[derive(Debug, serde::Serialize)]
pub struct AssetEntry {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct AssetsResponse {
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, serde::Serialize)]
pub struct BroadcastResponse {
    pub gateway: String,
    pub reply: Reply,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sources: Vec<SourceHealth>,
}

