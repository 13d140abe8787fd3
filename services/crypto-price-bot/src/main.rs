use std::sync::Arc;
use tracing::{info, warn, Level};

use crypto_price_bot::scheduler::{self, DailySchedule};
use crypto_price_bot::{
    AppState, AssetRegistry, BotConfig, ChatGateway, CoinGeckoClient, DiscordWebhook,
    DispatchSettings, Dispatcher, LogGateway,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting Crypto Price Bot...");

    let config = BotConfig::load()?;
    info!(
        "Config: prefix '{}', currencies {:?}, timezone {}",
        config.prefix, config.vs_currencies, config.timezone
    );

    let registry = Arc::new(AssetRegistry::builtin()?);
    info!("✓ Asset registry loaded ({} assets)", registry.len());

    let coingecko = Arc::new(CoinGeckoClient::new(
        &config.coingecko_base_url,
        config.coingecko_api_key.clone(),
        config.request_timeout(),
    )?);
    info!("✓ CoinGecko client initialized");

    let gateway: Arc<dyn ChatGateway> = match &config.discord_webhook_url {
        Some(url) => {
            info!("✓ Discord webhook configured");
            Arc::new(DiscordWebhook::new(url.clone(), config.request_timeout())?)
        }
        None => {
            warn!("⚠ No Discord webhook configured, broadcasts will only be logged");
            Arc::new(LogGateway)
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        coingecko,
        DispatchSettings::from_config(&config)?,
    ));

    if config.daily_update_enabled {
        let schedule = DailySchedule::new(config.daily_time()?, config.tz()?);
        tokio::spawn(scheduler::run_daily_broadcast(
            Arc::clone(&dispatcher),
            Arc::clone(&gateway),
            schedule,
        ));
        info!(
            "✓ Daily summary scheduled at {} {}",
            config.daily_update_time, config.timezone
        );
    }

    let state = Arc::new(AppState {
        dispatcher,
        gateway,
    });
    let app = crypto_price_bot::build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("🚀 Crypto Price Bot listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
