// Core structs: price bars, series, statistics, forecasts
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single bar as delivered by the provider, still indexed by timestamp.
#[derive(Debug, Clone)]
pub struct RawBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// A bar after normalization, indexed by calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Normalized daily history for one ticker. Bars are unique and ascending
/// by date; all price fields are finite.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<DailyBar>,
}

impl PriceSeries {
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn column_values(&self, column: Column) -> Vec<f64> {
        self.bars.iter().map(|b| column.value(b)).collect()
    }
}

/// The numeric columns of a daily price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Column::Open,
        Column::High,
        Column::Low,
        Column::Close,
        Column::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Open => "open",
            Column::High => "high",
            Column::Low => "low",
            Column::Close => "close",
            Column::Volume => "volume",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "open" => Some(Column::Open),
            "high" => Some(Column::High),
            "low" => Some(Column::Low),
            "close" => Some(Column::Close),
            "volume" => Some(Column::Volume),
            _ => None,
        }
    }

    pub fn value(self, bar: &DailyBar) -> f64 {
        match self {
            Column::Open => bar.open,
            Column::High => bar.high,
            Column::Low => bar.low,
            Column::Close => bar.close,
            Column::Volume => bar.volume as f64,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptive statistics for one column of a normalized series.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub max: f64,
    pub min: f64,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub variance: f64,
    pub std_dev: f64,
    /// Earliest date on which the maximum was reached.
    pub max_date: NaiveDate,
    /// Earliest date on which the minimum was reached.
    pub min_date: NaiveDate,
}

/// One forward step of a fitted forecast model.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Point forecasts with confidence bounds for one column, starting the day
/// after the last historical date.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub column: Column,
    pub confidence: f64,
    pub points: Vec<ForecastPoint>,
}

/// Latest traded price for a ticker.
#[derive(Debug, Clone)]
pub struct Quote {
    pub ticker: String,
    pub price: f64,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticker: String,
    pub days: u32,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(String),
    #[error("provider returned status {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("malformed chart payload: {0}")]
    Payload(String),
    #[error("chart payload missing field: {0}")]
    MissingField(&'static str),
    #[error("provider returned no data for symbol")]
    NoData,
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("series contains no usable rows")]
    EmptySeries,
    #[error("summary statistics need at least 2 rows, got {len}")]
    InsufficientData { len: usize },
    #[error("forecast model failed: {0}")]
    ModelFit(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
