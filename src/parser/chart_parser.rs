// Chart-endpoint payload decoding
use crate::model::{ParserError, Quote, RawBar};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartNode,
}

#[derive(Debug, Deserialize)]
struct ChartNode {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct ChartParser;

impl ChartParser {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a chart payload into raw bars. Rows the provider nulls out
    /// (gap days) are skipped, not zero-filled.
    pub fn parse_history(&self, payload: &str) -> Result<Vec<RawBar>, ParserError> {
        let envelope: ChartEnvelope =
            serde_json::from_str(payload).map_err(|e| ParserError::Payload(e.to_string()))?;

        let result = envelope
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or(ParserError::NoData)?;

        let timestamps = result.timestamp.ok_or(ParserError::MissingField("timestamp"))?;
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or(ParserError::MissingField("indicators.quote"))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let row = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
                continue;
            };
            let Some(timestamp) = DateTime::<Utc>::from_timestamp(ts, 0) else {
                continue;
            };

            bars.push(RawBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        Ok(bars)
    }

    /// Reads the latest traded price out of the payload metadata.
    pub fn parse_quote(&self, ticker: &str, payload: &str) -> Result<Quote, ParserError> {
        let envelope: ChartEnvelope =
            serde_json::from_str(payload).map_err(|e| ParserError::Payload(e.to_string()))?;

        let result = envelope
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or(ParserError::NoData)?;

        let price = result
            .meta
            .regular_market_price
            .ok_or(ParserError::MissingField("meta.regularMarketPrice"))?;
        let as_of = result
            .meta
            .regular_market_time
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .ok_or(ParserError::MissingField("meta.regularMarketTime"))?;

        Ok(Quote {
            ticker: ticker.to_string(),
            price,
            as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": 67012.5,
                    "regularMarketTime": 1710720000
                },
                "timestamp": [1710460800, 1710547200, 1710633600],
                "indicators": {
                    "quote": [{
                        "open":   [61000.0, null, 63500.0],
                        "high":   [62500.0, null, 64800.0],
                        "low":    [60100.0, null, 62900.0],
                        "close":  [62000.0, null, 64000.0],
                        "volume": [1200,    null, 1400]
                    }]
                }
            }]
        }
    }"#;

    #[test]
    fn parses_bars_and_skips_gap_rows() {
        let parser = ChartParser::new();
        let bars = parser.parse_history(PAYLOAD).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 62000.0);
        assert_eq!(bars[1].close, 64000.0);
        assert_eq!(bars[1].volume, 1400);
    }

    #[test]
    fn parses_quote_from_meta() {
        let parser = ChartParser::new();
        let quote = parser.parse_quote("BTC-USD", PAYLOAD).unwrap();

        assert_eq!(quote.ticker, "BTC-USD");
        assert_eq!(quote.price, 67012.5);
    }

    #[test]
    fn empty_result_is_no_data() {
        let parser = ChartParser::new();
        let err = parser
            .parse_history(r#"{"chart":{"result":null}}"#)
            .unwrap_err();
        assert!(matches!(err, ParserError::NoData));
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let parser = ChartParser::new();
        let err = parser.parse_history("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, ParserError::Payload(_)));
    }
}
