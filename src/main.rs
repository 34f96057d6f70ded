use exchange_backend::{
    AppState, app,
    config::AppConfig,
    services::{conversion::ConversionService, exchange_rate_api::ExchangeRateApiService},
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,exchange_backend=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    let exchange_rate_api = ExchangeRateApiService::new(
        config.exchange_api_key.clone(),
        &config.exchange_api_base_url,
        config.exchange_api_timeout,
    )?;
    if !exchange_rate_api.has_api_key() {
        tracing::warn!("EXCHANGE_API_KEY is not set; conversions will fail until it is configured");
    }

    let db = Arc::new(db);
    let state = AppState {
        conversion: ConversionService::new(db.clone(), exchange_rate_api),
        db,
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
