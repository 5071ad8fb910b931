mod analyzer;
mod config;
mod export;
mod model;
mod normalizer;
mod parser;
mod provider;

use analyzer::AnalyzerImpl;
use analyzer::forecast;
use analyzer::signal::trend_action;
use analyzer::statistics::Analyzer;
use config::{AppConfig, load_config};
use model::{AnalyticsError, Column, FetchRequest, PriceSeries};
use normalizer::normalize;
use parser::ChartParser;
use provider::{Provider, ProviderImpl};
use std::path::Path;
use std::sync::Arc;
use tokio::time::{Duration, timeout};
use tracing::{error, info, warn};
use tracing_subscriber;
use futures::future::join_all;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let provider = ProviderImpl::new();
    let parser = ChartParser::new();
    let analyzer = AnalyzerImpl::new();

    info!("Tickers to process: {}", config.tickers.len());

    // One render cycle: process all tickers concurrently, then exit.
    let tasks: Vec<_> = config
        .tickers
        .iter()
        .map(|ticker| process_ticker(ticker, &provider, &parser, &analyzer, config.clone()))
        .collect();
    join_all(tasks).await;

    info!("Render cycle complete.");
}

/// Processes a single ticker: fetch, parse, normalize, statistics, trend
/// signal, optional forecast, CSV export. A forecast failure leaves the
/// rest of the output intact.
async fn process_ticker(
    ticker: &str,
    provider: &ProviderImpl,
    parser: &ChartParser,
    analyzer: &AnalyzerImpl,
    config: Arc<AppConfig>,
) {
    info!("Processing ticker: {}", ticker);
    let request = FetchRequest {
        ticker: ticker.to_string(),
        days: config.history_days,
    };

    info!("Fetching history...");
    let payload = match provider.fetch(&request).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Provider error for {}: {}", ticker, e);
            return;
        }
    };

    let raw = match parser.parse_history(&payload) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Parse error for {}: {}", ticker, e);
            return;
        }
    };

    let series = match normalize(ticker, &raw) {
        Ok(series) => series,
        Err(e) => {
            warn!("No usable data for {}: {}", ticker, e);
            return;
        }
    };
    info!(
        "{}: {} daily bars ({} .. {})",
        ticker,
        series.bars.len(),
        series.bars[0].date,
        series.bars[series.bars.len() - 1].date
    );

    // Current price lookup stays explicit; the render falls back to "n/a".
    let price_text = current_price_text(provider, parser, ticker).await;
    info!("{}: current price {}", ticker, price_text);

    let action = trend_action(&series);
    info!("{}: trend action {}", ticker, action.label());

    match analyzer.compute_stats(&series) {
        Ok(stats) => {
            for (column, row) in &stats {
                info!(
                    "{} {:>6}: max {:.2} ({}) | min {:.2} ({}) | mean {:.2} | median {:.2} | mode {:.2} | stddev {:.2}",
                    ticker,
                    column,
                    row.max,
                    row.max_date,
                    row.min,
                    row.min_date,
                    row.mean,
                    row.median,
                    row.mode,
                    row.std_dev
                );
            }
        }
        Err(e) => warn!("Statistics unavailable for {}: {}", ticker, e),
    }

    let export_dir = Path::new(&config.export_dir).to_path_buf();
    match export::export_history(&series, &export_dir) {
        Ok(path) => info!("{}: history exported to {}", ticker, path.display()),
        Err(e) => warn!("History export failed for {}: {}", ticker, e),
    }

    if config.forecast_enabled {
        for name in &config.forecast_columns {
            let Some(column) = Column::from_name(name) else {
                warn!("Unknown forecast column in config: {}", name);
                continue;
            };
            match fit_with_timeout(&series, column, &config).await {
                Ok(forecast) => {
                    if let (Some(first), Some(last)) =
                        (forecast.points.first(), forecast.points.last())
                    {
                        info!(
                            "{} {} forecast: {} {:.2} [{:.2}, {:.2}] .. {} {:.2} [{:.2}, {:.2}]",
                            ticker,
                            column,
                            first.date,
                            first.predicted,
                            first.lower,
                            first.upper,
                            last.date,
                            last.predicted,
                            last.lower,
                            last.upper
                        );
                    }
                    match export::export_forecast(ticker, &forecast, &export_dir) {
                        Ok(path) => info!("{}: forecast exported to {}", ticker, path.display()),
                        Err(e) => warn!("Forecast export failed for {}: {}", ticker, e),
                    }
                }
                // statistics and raw data above still rendered
                Err(e) => warn!("Forecast unavailable for {} {}: {}", ticker, column, e),
            }
        }
    }

    info!("Finished processing ticker: {}", ticker);
}

/// Formats the latest traded price, or "n/a" when the lookup fails. The
/// failure itself is logged, never swallowed.
async fn current_price_text(
    provider: &ProviderImpl,
    parser: &ChartParser,
    ticker: &str,
) -> String {
    let request = FetchRequest {
        ticker: ticker.to_string(),
        days: 1,
    };
    match provider.fetch(&request).await {
        Ok(payload) => match parser.parse_quote(ticker, &payload) {
            Ok(quote) => format!("{:.2} (as of {})", quote.price, quote.as_of),
            Err(e) => {
                warn!("Quote parse error for {}: {}", ticker, e);
                "n/a".to_string()
            }
        },
        Err(e) => {
            warn!("Quote fetch error for {}: {}", ticker, e);
            "n/a".to_string()
        }
    }
}

/// Runs the model fit on a blocking thread under the configured timeout;
/// both a timeout and a crashed fit surface as a model failure.
async fn fit_with_timeout(
    series: &PriceSeries,
    column: Column,
    config: &AppConfig,
) -> Result<model::Forecast, AnalyticsError> {
    let series = series.clone();
    let horizon = config.forecast_horizon_days;
    let confidence = config.confidence_level;

    let fit = tokio::task::spawn_blocking(move || {
        forecast::forecast_column(&series, column, horizon, confidence)
    });

    match timeout(Duration::from_secs(config.fit_timeout_seconds), fit).await {
        Err(_) => Err(AnalyticsError::ModelFit("model fit timed out".into())),
        Ok(Err(e)) => Err(AnalyticsError::ModelFit(format!("model fit task failed: {}", e))),
        Ok(Ok(result)) => result,
    }
}
