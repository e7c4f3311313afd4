//! Crypto Market Insight - Main application entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};

use crypto_market_insight::{
    Config,
    application::{AuthServiceImpl, MarketServiceImpl},
    infrastructure::{
        api_clients::{CoinGeckoClient, MarketDataClient},
        cache::{CachingMarketDataClient, MarketCaches},
        database::{Database, UserRepository},
        oauth::GitHubOAuthClient,
        security::JwtTokenProvider,
    },
    init_tracing, metrics,
    presentation::{AppState, create_router},
};

const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing and metrics
    init_tracing(&config.logging)?;
    metrics::init();

    tracing::info!("Starting Crypto Market Insight server...");
    tracing::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    // Persistence
    let database = Database::new(&config.database).await?;
    let users: Arc<dyn UserRepository> = Arc::new(database.users());

    // Market data: CoinGecko behind the caching decorator
    let caches = Arc::new(MarketCaches::new(&config.cache));
    let coingecko: Arc<dyn MarketDataClient> = Arc::new(CoinGeckoClient::new(&config.coingecko)?);
    let market_client: Arc<dyn MarketDataClient> =
        Arc::new(CachingMarketDataClient::new(coingecko, caches.clone()));
    let market_service = Arc::new(MarketServiceImpl::new(market_client));
    spawn_cache_cleanup(caches.clone());

    // Authentication
    let tokens = Arc::new(JwtTokenProvider::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_ms,
    )?);
    let github = Arc::new(GitHubOAuthClient::new(
        &config.auth.github,
        config.github_callback_uri(),
    )?);
    if config.auth.github.client_id.is_empty() {
        tracing::warn!("GitHub OAuth client id is not configured; login will fail");
    }
    let auth_service = Arc::new(AuthServiceImpl::new(
        users.clone(),
        github,
        tokens,
        config.auth.frontend_redirect_uri.clone(),
    ));

    // Create application state
    let app_state = AppState {
        market_service,
        auth_service,
        caches,
        users,
    };

    // Create router
    let app = create_router(app_state, &config);

    // Create server address
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!("Server listening on {}", addr);
    if config.server.enable_docs {
        tracing::info!("API documentation available at http://{}/swagger-ui", addr);
    } else {
        tracing::info!("API documentation disabled (enable_docs=false)");
    }

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.pool().close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Purge expired market data entries once a minute
fn spawn_cache_cleanup(caches: Arc<MarketCaches>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = caches.cleanup_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Purged expired cache entries");
            }
        }
    });
}

/// Handle graceful shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
