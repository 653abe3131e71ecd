//! screener-cli: value-screen a batch of tickers from a local dataset.
//!
//! The dataset is a JSON array of `{ "snapshot": {...}, "bars": [...] }`
//! records. Each ticker is scored, categorized and forecast, then the batch
//! is ranked by the Magic Formula and printed as JSON.
//!
//! Usage:
//!   screener-cli data.json
//!   screener-cli data.json --tickers "AAPL, MSFT GOOGL"
//!   screener-cli data.json --horizon 20 --pretty

use analysis_orchestrator::{parse_ticker_list, AnalysisConfig, AnalysisOrchestrator, StockScreener, TickerInput};
use anyhow::Context;

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Logs go to stderr so stdout stays valid JSON.
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  screener-cli DATASET.json [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --tickers LIST   Comma/space separated tickers to pick from the dataset");
    eprintln!("  --horizon N      Forecast horizon in trading days (default: 30)");
    eprintln!("  --pretty         Pretty-print the JSON report");
}

/// Pick the requested tickers from the dataset in request order.
fn select_inputs(dataset: Vec<TickerInput>, tickers: &[String]) -> Vec<TickerInput> {
    if tickers.is_empty() {
        return dataset;
    }
    tickers
        .iter()
        .filter_map(|ticker| {
            let found = dataset
                .iter()
                .find(|input| input.symbol().eq_ignore_ascii_case(ticker))
                .cloned();
            if found.is_none() {
                tracing::error!("No data for {}, skipping", ticker);
            }
            found
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(dataset_path) = args.get(1).filter(|a| !a.starts_with("--")) else {
        print_usage();
        std::process::exit(1);
    };

    let tickers = args
        .iter()
        .position(|a| a == "--tickers")
        .and_then(|i| args.get(i + 1))
        .map(|raw| parse_ticker_list(raw))
        .unwrap_or_default();

    let horizon: Option<usize> = args
        .iter()
        .position(|a| a == "--horizon")
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok());

    let pretty = args.iter().any(|a| a == "--pretty");

    let mut config = AnalysisConfig::from_env();
    if let Some(horizon) = horizon.filter(|h| *h > 0) {
        config.forecast.horizon_days = horizon;
    }

    let raw = std::fs::read_to_string(dataset_path)
        .with_context(|| format!("Failed to read dataset {}", dataset_path))?;
    let dataset: Vec<TickerInput> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid dataset JSON in {}", dataset_path))?;

    let inputs = select_inputs(dataset, &tickers);
    if inputs.is_empty() {
        anyhow::bail!("Could not find valid data for any of the provided tickers");
    }

    tracing::info!(
        "Screening {} tickers (horizon {} days, batch cap {})",
        inputs.len(),
        config.forecast.horizon_days,
        config.max_batch_size
    );

    let orchestrator = AnalysisOrchestrator::new(config);
    let result = StockScreener::new(&orchestrator).screen(&inputs);

    let output = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", output);

    Ok(())
}
