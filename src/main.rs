use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use http::HeaderValue;
use tower_governor::governor::GovernorConfigBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cooktube::config::Config;
use cooktube::routes;
use cooktube::services::oauth::Credentials;
use cooktube::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    if Credentials::from_config(&config.google).is_err() {
        tracing::warn!("⚠️ GOOGLE_CLIENT_ID/GOOGLE_CLIENT_SECRET not set; login will fail");
    }
    tracing::info!(
        same_site = ?config.cookie_policy.same_site(),
        secure = config.cookie_policy.secure(),
        "🍪 Cookie policy"
    );

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid API_HOST/API_PORT")?;

    let state = AppState::new(config)?;
    tracing::info!("✅ AppState initialized");

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(50)
            .burst_size(200)
            .use_headers()
            .finish()
            .context("Invalid rate limit configuration")?,
    );

    let app = routes::app(state)
        .layer(tower_governor::GovernorLayer::new(governor_conf))
        .layer(routes::cors_layer(origins));

    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
