use equity_aggregator::{AppConfig, StockAnalyzer};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some(symbol) = std::env::args().nth(1) else {
        eprintln!("usage: stock-report <SYMBOL>");
        return ExitCode::from(2);
    };

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let analyzer = match StockAnalyzer::from_config(&config) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("Failed to initialize: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(symbol = %symbol, "Running analysis");

    match analyzer.analyze(&symbol).await {
        Ok(report) => {
            println!("{}", report.summary);
            if let Some(reason) = &report.enrichment_error {
                eprintln!("\n(enrichment skipped: {})", reason);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
