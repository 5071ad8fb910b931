use crate::model::{AnalyticsError, DailyBar, PriceSeries, RawBar};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Collapses timestamp-indexed bars into one bar per UTC calendar day.
///
/// The date becomes the unique key: if the provider yields several bars for
/// the same day, the one with the latest timestamp wins. Rows with
/// non-finite prices, or a zero close (the provider's gap marker), are
/// dropped rather than carried into the statistics.
pub fn normalize(ticker: &str, raw: &[RawBar]) -> Result<PriceSeries, AnalyticsError> {
    let mut by_date: BTreeMap<NaiveDate, (DateTime<Utc>, DailyBar)> = BTreeMap::new();

    for bar in raw {
        if !is_valid(bar) {
            continue;
        }
        let date = bar.timestamp.date_naive();
        let daily = DailyBar {
            date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        };
        match by_date.get(&date) {
            Some((seen, _)) if *seen > bar.timestamp => {}
            _ => {
                by_date.insert(date, (bar.timestamp, daily));
            }
        }
    }

    if by_date.is_empty() {
        return Err(AnalyticsError::EmptySeries);
    }

    Ok(PriceSeries {
        ticker: ticker.to_string(),
        bars: by_date.into_values().map(|(_, bar)| bar).collect(),
    })
}

fn is_valid(bar: &RawBar) -> bool {
    bar.open.is_finite()
        && bar.high.is_finite()
        && bar.low.is_finite()
        && bar.close.is_finite()
        && bar.close != 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(y: i32, m: u32, d: u32, hour: u32, close: f64) -> RawBar {
        RawBar {
            timestamp: Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap(),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn collapses_intraday_timestamps_to_dates() {
        let input = vec![
            raw(2024, 3, 1, 9, 100.0),
            raw(2024, 3, 1, 21, 105.0),
            raw(2024, 3, 2, 0, 110.0),
        ];
        let series = normalize("BTC-USD", &input).unwrap();

        assert_eq!(series.bars.len(), 2);
        // the later bar for 2024-03-01 wins
        assert_eq!(series.bars[0].close, 105.0);
        assert_eq!(series.bars[1].close, 110.0);
    }

    #[test]
    fn dates_are_strictly_increasing() {
        let input = vec![
            raw(2024, 3, 3, 0, 3.0),
            raw(2024, 3, 1, 0, 1.0),
            raw(2024, 3, 2, 0, 2.0),
            raw(2024, 3, 1, 12, 1.5),
        ];
        let series = normalize("BTC-USD", &input).unwrap();

        assert!(series.bars.len() <= input.len());
        for pair in series.bars.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn empty_input_fails() {
        let err = normalize("BTC-USD", &[]).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptySeries));
    }

    #[test]
    fn drops_non_finite_and_gap_rows() {
        let mut nan_bar = raw(2024, 3, 1, 0, 100.0);
        nan_bar.close = f64::NAN;
        let mut gap_bar = raw(2024, 3, 2, 0, 100.0);
        gap_bar.close = 0.0;
        let good = raw(2024, 3, 3, 0, 101.0);

        let series = normalize("BTC-USD", &[nan_bar.clone(), gap_bar.clone(), good]).unwrap();
        assert_eq!(series.bars.len(), 1);
        assert_eq!(series.bars[0].close, 101.0);

        let err = normalize("BTC-USD", &[nan_bar, gap_bar]).unwrap_err();
        assert!(matches!(err, AnalyticsError::EmptySeries));
    }
}
