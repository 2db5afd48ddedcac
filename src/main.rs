use axum::{
    routing::{get, patch, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_fb_ads_api::config::Config;
use rust_fb_ads_api::db::Database;
use rust_fb_ads_api::db_storage::AdsStorage;
use rust_fb_ads_api::graph_client::GraphClient;
use rust_fb_ads_api::handlers::{self, AppState};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the database pool (running migrations),
/// the Graph API client and the ad set cache, then serves the HTTP routes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_fb_ads_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let graph = GraphClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize Graph client: {}", e))?;
    tracing::info!(
        "✓ Graph API client initialized: {}/{}",
        config.facebook_graph_base_url,
        config.facebook_api_version
    );

    // Synced ad sets (5 minute TTL, 10k max entries)
    let adset_cache = Cache::builder()
        .time_to_live(Duration::from_secs(300))
        .max_capacity(10_000)
        .build();
    tracing::info!("Ad set cache initialized");

    let app_state = Arc::new(AppState {
        storage: AdsStorage::new(db.pool.clone()),
        graph,
        adset_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        // Dry-run normalization
        .route(
            "/api/v1/normalize/campaign",
            post(handlers::normalize_campaign),
        )
        .route("/api/v1/normalize/adset", post(handlers::normalize_adset))
        .route("/api/v1/normalize/ad", post(handlers::normalize_ad))
        // Hierarchy management
        .route("/api/v1/campaigns", post(handlers::create_campaign))
        .route(
            "/api/v1/campaigns/:id",
            patch(handlers::update_campaign).delete(handlers::delete_campaign),
        )
        .route("/api/v1/adsets", post(handlers::create_adset))
        .route(
            "/api/v1/adsets/:id",
            patch(handlers::update_adset).delete(handlers::delete_adset),
        )
        .route("/api/v1/ads", post(handlers::create_ad))
        .route(
            "/api/v1/ads/:id",
            patch(handlers::update_ad).delete(handlers::delete_ad),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
