use market_scraper::config::AppConfig;
use market_scraper::database::repositories::{
    SettingsRepository, SettingsRepositoryImpl, TickRepository, TickRepositoryImpl,
};
use market_scraper::database::{
    establish_connection_pool, InMemorySettingsRepository, InMemoryTickRepository,
};
use market_scraper::jobs::{JobRegistry, ScrapeJobController, ScrapePipeline};
use market_scraper::market_data::{MarketDataService, QuoteSource, TwelveDataClient};
use market_scraper::metrics::ScrapeStats;
use market_scraper::{create_router, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_scraper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    let (tick_repository, settings_repository) = initialize_repositories(&config);
    let market_data = MarketDataService::new(tick_repository);

    let source: Arc<dyn QuoteSource> = Arc::new(TwelveDataClient::new(
        &config.quote_api_base_url,
        config.quote_api_key.clone(),
    )?);

    tracing::info!("📡 Quote provider: {}", config.quote_api_base_url);
    tracing::info!("   Symbols: {}", config.quote_symbols.join(","));
    tracing::info!("   Interval: {}, output size: {}", config.quote_interval, config.quote_output_size);

    // Registry stays empty until a start request registers the scrape job
    let registry = Arc::new(JobRegistry::new());

    let pipeline = Arc::new(ScrapePipeline::new(
        source,
        config.quote_request(),
        market_data.clone(),
        Arc::new(ScrapeStats::new()),
    ));
    let scrape_jobs = Arc::new(ScrapeJobController::new(
        registry,
        settings_repository,
        pipeline,
    ));

    let app = create_router(AppState {
        market_data,
        scrape_jobs: scrape_jobs.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("🚀 Market Scraper running on http://{}", config.bind_addr);
    tracing::info!("📊 Health check: http://{}/health", config.bind_addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", config.bind_addr);
    tracing::info!("🔧 Scrape control: http://{}/market/automate-scrap/{{start|stop|status}}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("🛑 Server stopped, cleaning up scrape job...");
    scrape_jobs.shutdown(config.shutdown_timeout).await;

    Ok(())
}

/// Pick diesel repositories when DATABASE_URL is set, in-memory otherwise
fn initialize_repositories(
    config: &AppConfig,
) -> (Arc<dyn TickRepository>, Arc<dyn SettingsRepository>) {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::info!("🗄️  DATABASE_URL not set, using in-memory storage");
        return in_memory_repositories();
    };

    tracing::info!("🗄️  Initializing PostgreSQL connection...");

    let pool = match establish_connection_pool(database_url, config.db_pool_max_size) {
        Ok(pool) => {
            tracing::info!("✅ Database connection established successfully");
            pool
        }
        Err(e) => {
            tracing::error!("❌ Failed to establish database connection: {}", e);
            tracing::warn!("⚠️  Server will start with in-memory storage");
            return in_memory_repositories();
        }
    };

    let pool_clone = pool.clone();
    let tick_repository = Arc::new(TickRepositoryImpl::new(move || pool_clone.get_conn()))
        as Arc<dyn TickRepository>;

    let settings_repository = Arc::new(SettingsRepositoryImpl::new(move || pool.get_conn()))
        as Arc<dyn SettingsRepository>;

    (tick_repository, settings_repository)
}

fn in_memory_repositories() -> (Arc<dyn TickRepository>, Arc<dyn SettingsRepository>) {
    (
        Arc::new(InMemoryTickRepository::new()),
        Arc::new(InMemorySettingsRepository::new()),
    )
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
