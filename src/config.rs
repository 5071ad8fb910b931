use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub tickers: Vec<String>,
    /// Trailing window of daily history to request from the provider.
    pub history_days: u32,
    pub forecast_enabled: bool,
    pub forecast_horizon_days: usize,
    /// Columns to forecast, by name (e.g. "close").
    pub forecast_columns: Vec<String>,
    pub confidence_level: f64,
    pub fit_timeout_seconds: u64,
    pub export_dir: String,
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
