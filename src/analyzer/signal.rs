use crate::model::PriceSeries;

/// Trading action derived from the close-price trend of the displayed
/// window. A net rise over the window reads as a selling opportunity, a net
/// drop as a buying opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendAction {
    Buy,
    Sell,
    Hold,
}

impl TrendAction {
    pub fn label(self) -> &'static str {
        match self {
            TrendAction::Buy => "Buy",
            TrendAction::Sell => "Sell",
            TrendAction::Hold => "Hold",
        }
    }
}

pub fn trend_action(series: &PriceSeries) -> TrendAction {
    let (Some(first), Some(last)) = (series.bars.first(), series.bars.last()) else {
        return TrendAction::Hold;
    };

    let change = last.close - first.close;
    if change > 0.0 {
        TrendAction::Sell
    } else if change < 0.0 {
        TrendAction::Buy
    } else {
        TrendAction::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DailyBar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10,
            })
            .collect();
        PriceSeries {
            ticker: "ETH-USD".to_string(),
            bars,
        }
    }

    #[test]
    fn rising_window_reads_sell() {
        assert_eq!(trend_action(&series(&[100.0, 90.0, 120.0])), TrendAction::Sell);
    }

    #[test]
    fn falling_window_reads_buy() {
        assert_eq!(trend_action(&series(&[100.0, 110.0, 80.0])), TrendAction::Buy);
    }

    #[test]
    fn flat_window_reads_hold() {
        assert_eq!(trend_action(&series(&[100.0, 150.0, 100.0])), TrendAction::Hold);
        assert_eq!(trend_action(&series(&[])), TrendAction::Hold);
    }
}
