// CSV export: the contract consumed by the presentation layer.
use crate::model::{ExportError, Forecast, PriceSeries};
use csv::Writer;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the normalized history as UTF-8 CSV: header row, one row per
/// date, date column first in ISO-8601.
pub fn export_history(series: &PriceSeries, dir: &Path) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.csv", series.ticker));

    let mut writer = Writer::from_path(&path)?;
    for bar in &series.bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;

    Ok(path)
}

/// Writes a fitted forecast next to the history export.
pub fn export_forecast(
    ticker: &str,
    forecast: &Forecast,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}_{}_forecast.csv", ticker, forecast.column));

    let mut writer = Writer::from_path(&path)?;
    for point in &forecast.points {
        writer.serialize(point)?;
    }
    writer.flush()?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DailyBar;
    use chrono::NaiveDate;
    use std::env;

    fn temp_dir(tag: &str) -> PathBuf {
        env::temp_dir().join(format!("coindash-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn history_export_is_iso_dated_csv() {
        let series = PriceSeries {
            ticker: "BTC-USD".to_string(),
            bars: vec![
                DailyBar {
                    date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                    open: 61000.0,
                    high: 62500.0,
                    low: 60100.0,
                    close: 62000.0,
                    volume: 1200,
                },
                DailyBar {
                    date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                    open: 62000.0,
                    high: 64800.0,
                    low: 61900.0,
                    close: 64000.0,
                    volume: 1400,
                },
            ],
        };

        let dir = temp_dir("history");
        let path = export_history(&series, &dir).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,open,high,low,close,volume");
        assert!(lines[1].starts_with("2024-03-01,"));
        assert!(lines[2].starts_with("2024-03-02,"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
