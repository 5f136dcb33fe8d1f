use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use site_cloner::{
    api::routes::create_router,
    config::Config,
    error::AppError,
    generator::CloneGenerator,
    llm::provider_from_settings,
    pipeline::ClonePipeline,
    scraper::{ContentExtractor, HttpFetcher},
    store::CloneStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    let fetcher = HttpFetcher::new(config.scrape.attempt_timeout)
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
    let extractor = ContentExtractor::new(Arc::new(fetcher), config.scrape.clone());
    let generator = CloneGenerator::new(provider_from_settings(&config.llm)?)
        .with_field_limit(config.max_content_chars);
    let store = CloneStore::open(config.clones_dir.clone()).await?;
    tracing::info!("Storing clones in {}", store.dir().display());

    let pipeline = ClonePipeline::new(extractor, generator, store)
        .with_max_output_bytes(config.max_output_bytes);

    let app_state = AppState {
        pipeline: Arc::new(pipeline),
        request_timeout: config.request_timeout,
        cors_origin: config.cors_origin.clone(),
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind(config.server_addr).await?;
    tracing::info!("Listening on {}", config.server_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
