pub mod types;
pub mod sources {
    pub mod coingecko;
}
pub mod assets;
pub mod chart;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod handlers;
pub mod normalizers;
pub mod reducer;
pub mod render;
pub mod scheduler;

pub use assets::{Asset, AssetRegistry};
pub use config::BotConfig;
pub use dispatch::{DispatchSettings, Dispatcher};
pub use gateway::{ChatGateway, DiscordWebhook, LogGateway};
pub use reducer::{reduce, DEFAULT_MAX_POINTS};
pub use render::{Embed, Reply};
pub use sources::coingecko::CoinGeckoClient;
pub use types::*;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub gateway: Arc<dyn ChatGateway>,
}

/// HTTP surface: command relay, asset listing, manual broadcast, health
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/commands", post(handlers::post_command))
        .route("/assets", get(handlers::list_assets))
        .route("/broadcast", post(handlers::trigger_broadcast))
        .route("/health", get(handlers::health_check))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
