use equity_aggregator::{api::start_server, AppConfig, StockAnalyzer};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    info!("Equity Aggregator - API Server");
    info!(port = config.port, "Configuration loaded");
    if !config.enrichment_configured() {
        warn!("GEMINI_API_KEY not set in .env, reports will not be enriched");
    }

    let analyzer = Arc::new(StockAnalyzer::from_config(&config)?);

    info!("Starting API server...");

    start_server(analyzer, config.port).await?;

    Ok(())
}
