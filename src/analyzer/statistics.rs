use crate::model::{AnalyticsError, Column, ColumnStats, PriceSeries};
use std::collections::BTreeMap;

/// Trait defining the interface for the series analyzer.
pub trait Analyzer {
    fn compute_stats(
        &self,
        series: &PriceSeries,
    ) -> Result<BTreeMap<Column, ColumnStats>, AnalyticsError>;
}

/// Implementation of the series analyzer.
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Analyzer for AnalyzerImpl {
    /// Calculates descriptive statistics for every numeric column of the
    /// series. Sample variance needs two rows, so shorter series are
    /// rejected outright.
    fn compute_stats(
        &self,
        series: &PriceSeries,
    ) -> Result<BTreeMap<Column, ColumnStats>, AnalyticsError> {
        if series.bars.len() < 2 {
            return Err(AnalyticsError::InsufficientData {
                len: series.bars.len(),
            });
        }

        let mut out = BTreeMap::new();
        for column in Column::ALL {
            out.insert(column, column_stats(series, column));
        }
        Ok(out)
    }
}

fn column_stats(series: &PriceSeries, column: Column) -> ColumnStats {
    let values = series.column_values(column);
    let n = values.len() as f64;

    // Extrema with their dates; on equal values the earliest date wins, so
    // the result does not depend on row order.
    let first = &series.bars[0];
    let mut max = column.value(first);
    let mut min = max;
    let mut max_date = first.date;
    let mut min_date = first.date;
    for bar in &series.bars[1..] {
        let v = column.value(bar);
        if v > max || (v == max && bar.date < max_date) {
            max = v;
            max_date = bar.date;
        }
        if v < min || (v == min && bar.date < min_date) {
            min = v;
            min_date = bar.date;
        }
    }

    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);

    ColumnStats {
        max,
        min,
        mean,
        median: median(&values),
        mode: mode(&values),
        variance,
        std_dev: variance.sqrt(),
        max_date,
        min_date,
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Most frequent value; among equally frequent values the smallest wins.
fn mode(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut best = sorted[0];
    let mut best_count = 0usize;
    let mut run_start = 0usize;

    for i in 0..=sorted.len() {
        if i == sorted.len() || sorted[i] != sorted[run_start] {
            let run_len = i - run_start;
            // strict comparison keeps the smallest value of a tie, since
            // runs are visited in ascending order
            if run_len > best_count {
                best_count = run_len;
                best = sorted[run_start];
            }
            if i < sorted.len() {
                run_start = i;
            }
        }
    }

    best
}
