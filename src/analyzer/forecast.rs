//! Seasonal ARIMA forecasting for daily price columns.
//!
//! Fixed order: ARIMA(5,1,0) with a weekly (1,1,1) seasonal part. The
//! seasonal polynomial is estimated in additive form via two-stage
//! conditional least squares (a long autoregression supplies residual
//! proxies for the moving-average regressor), and forecasts extend the
//! fitted equation recursively with future innovations at zero.

use crate::model::{AnalyticsError, Column, Forecast, ForecastPoint, PriceSeries};
use chrono::{Duration, NaiveDate};
use nalgebra::{DMatrix, DVector};

pub const AR_ORDER: usize = 5;
pub const SEASON_LENGTH: usize = 7;
/// Two full seasonal cycles plus the autoregressive lag.
pub const MIN_OBSERVATIONS: usize = 21;

const ZERO_VARIANCE_EPS: f64 = 1e-12;

/// Fits the model to one column of the series and produces `horizon` point
/// forecasts with two-sided confidence bounds, dated from the day after the
/// last historical bar.
pub fn forecast_column(
    series: &PriceSeries,
    column: Column,
    horizon: usize,
    confidence: f64,
) -> Result<Forecast, AnalyticsError> {
    let last_date = series.last_date().ok_or(AnalyticsError::EmptySeries)?;
    let values = series.column_values(column);
    let model = SeasonalArima::fit(&values)?;
    Ok(model.forecast(&values, column, last_date, horizon, confidence))
}

/// Estimated model: w_t = c + Σ φ_i·w_{t-i} + Φ·w_{t-s} + Θ·e_{t-s} + e_t
/// over the regularly-then-seasonally differenced series w.
#[derive(Debug, Clone)]
pub struct SeasonalArima {
    ar: [f64; AR_ORDER],
    seasonal_ar: f64,
    seasonal_ma: f64,
    constant: f64,
    /// Residuals aligned with the differenced series.
    residuals: Vec<f64>,
    pub sigma2: f64,
}

impl SeasonalArima {
    pub fn fit(values: &[f64]) -> Result<Self, AnalyticsError> {
        if values.len() < MIN_OBSERVATIONS {
            return Err(AnalyticsError::ModelFit(format!(
                "need at least {} observations, got {}",
                MIN_OBSERVATIONS,
                values.len()
            )));
        }

        let d1 = difference(values, 1);
        let w = difference(&d1, SEASON_LENGTH);

        // A constant column differences to (near-)zero variance; the normal
        // equations would be singular, but the model is trivial.
        let mean_w = w.iter().sum::<f64>() / w.len() as f64;
        let var_w = w.iter().map(|v| (v - mean_w).powi(2)).sum::<f64>() / w.len() as f64;
        if var_w < ZERO_VARIANCE_EPS {
            let residuals: Vec<f64> = w.iter().map(|v| v - mean_w).collect();
            return Ok(Self {
                ar: [0.0; AR_ORDER],
                seasonal_ar: 0.0,
                seasonal_ma: 0.0,
                constant: mean_w,
                residuals,
                sigma2: var_w,
            });
        }

        // Stage 1: long autoregression to proxy the unobserved innovations.
        let long_order = (2 * SEASON_LENGTH).max(10).min(w.len() / 4).max(1);
        let (_, _, long_residuals) = estimate_ar(&w, long_order)
            .ok_or_else(|| AnalyticsError::ModelFit("long autoregression is singular".into()))?;
        let mut proxy = vec![0.0; w.len()];
        proxy[long_order..].copy_from_slice(&long_residuals);

        // Stage 2: least squares over the full set of regressors.
        let start = long_order + SEASON_LENGTH;
        let params = AR_ORDER + 3;
        if w.len() < start + params + 2 {
            return Err(AnalyticsError::ModelFit(
                "history too short to estimate seasonal terms".into(),
            ));
        }

        let rows = w.len() - start;
        let mut x_data = Vec::with_capacity(rows * params);
        let mut y_data = Vec::with_capacity(rows);
        for t in start..w.len() {
            y_data.push(w[t]);
            x_data.push(1.0);
            for i in 1..=AR_ORDER {
                x_data.push(w[t - i]);
            }
            x_data.push(w[t - SEASON_LENGTH]);
            x_data.push(proxy[t - SEASON_LENGTH]);
        }

        let x = DMatrix::from_row_slice(rows, params, &x_data);
        let y = DVector::from_vec(y_data);
        let beta = solve_ols(&x, &y)
            .ok_or_else(|| AnalyticsError::ModelFit("normal equations are singular".into()))?;

        let constant = beta[0];
        let mut ar = [0.0; AR_ORDER];
        for i in 0..AR_ORDER {
            ar[i] = beta[1 + i];
        }
        let seasonal_ar = beta[1 + AR_ORDER];
        let seasonal_ma = beta[2 + AR_ORDER];

        let mut model = Self {
            ar,
            seasonal_ar,
            seasonal_ma,
            constant,
            residuals: Vec::new(),
            sigma2: 0.0,
        };
        model.rebuild_residuals(&w);
        Ok(model)
    }

    /// Recomputes in-sample residuals recursively with the fitted equation,
    /// with presample innovations held at zero.
    fn rebuild_residuals(&mut self, w: &[f64]) {
        let mut residuals = vec![0.0; w.len()];
        for t in SEASON_LENGTH..w.len() {
            let pred = self.one_step(w, &residuals, t);
            residuals[t] = w[t] - pred;
        }
        let tail = &residuals[SEASON_LENGTH..];
        self.sigma2 = tail.iter().map(|e| e * e).sum::<f64>() / tail.len().max(1) as f64;
        self.residuals = residuals;
    }

    /// One-step prediction of w[t] from everything before t.
    fn one_step(&self, w: &[f64], residuals: &[f64], t: usize) -> f64 {
        let mut pred = self.constant;
        for i in 1..=AR_ORDER {
            if t >= i {
                pred += self.ar[i - 1] * w[t - i];
            }
        }
        if t >= SEASON_LENGTH {
            pred += self.seasonal_ar * w[t - SEASON_LENGTH];
            pred += self.seasonal_ma * residuals[t - SEASON_LENGTH];
        }
        pred
    }

    pub fn forecast(
        &self,
        values: &[f64],
        column: Column,
        last_date: NaiveDate,
        horizon: usize,
        confidence: f64,
    ) -> Forecast {
        let d1 = difference(values, 1);
        let w = difference(&d1, SEASON_LENGTH);

        // Recursive extension on the differenced scale, future innovations
        // at their zero expectation.
        let mut extended_w = w.clone();
        let mut extended_e = self.residuals.clone();
        for _ in 0..horizon {
            let t = extended_w.len();
            let pred = self.one_step(&extended_w, &extended_e, t);
            extended_w.push(pred);
            extended_e.push(0.0);
        }

        // Invert the seasonal, then the regular differencing.
        let mut d1_ext = d1.clone();
        for k in 0..horizon {
            let base = d1_ext[d1_ext.len() - SEASON_LENGTH];
            d1_ext.push(extended_w[w.len() + k] + base);
        }

        let z = z_score(confidence);
        let se = self.standard_errors(horizon);
        let mut level = values.last().copied().unwrap_or(0.0);
        let mut points = Vec::with_capacity(horizon);
        for k in 0..horizon {
            level += d1_ext[d1.len() + k];
            points.push(ForecastPoint {
                date: last_date + Duration::days(k as i64 + 1),
                predicted: level,
                lower: level - z * se[k],
                upper: level + z * se[k],
            });
        }

        Forecast {
            column,
            confidence,
            points,
        }
    }

    /// Forecast standard errors from the psi-weight recursion of the model
    /// polynomials composed with the differencing operators.
    fn standard_errors(&self, horizon: usize) -> Vec<f64> {
        // AR side: (1 - Σ φ_i B^i - Φ B^s)(1 - B)(1 - B^s)
        let mut phi_poly = vec![0.0; SEASON_LENGTH + 1];
        phi_poly[0] = 1.0;
        for i in 1..=AR_ORDER {
            phi_poly[i] = -self.ar[i - 1];
        }
        phi_poly[SEASON_LENGTH] = -self.seasonal_ar;

        let mut seasonal_diff = vec![0.0; SEASON_LENGTH + 1];
        seasonal_diff[0] = 1.0;
        seasonal_diff[SEASON_LENGTH] = -1.0;

        let full = poly_mul(&poly_mul(&phi_poly, &[1.0, -1.0]), &seasonal_diff);

        // MA side: 1 + Θ B^s
        let mut theta = vec![0.0; SEASON_LENGTH + 1];
        theta[0] = 1.0;
        theta[SEASON_LENGTH] = self.seasonal_ma;

        let mut psi = vec![0.0; horizon.max(1)];
        psi[0] = 1.0;
        for j in 1..psi.len() {
            let mut value = *theta.get(j).unwrap_or(&0.0);
            for i in 1..=j.min(full.len() - 1) {
                value += -full[i] * psi[j - i];
            }
            psi[j] = value;
        }

        let mut acc = 0.0;
        (0..horizon)
            .map(|h| {
                acc += psi[h] * psi[h];
                (self.sigma2 * acc).sqrt()
            })
            .collect()
    }
}

/// Differences a series at the given lag.
fn difference(data: &[f64], lag: usize) -> Vec<f64> {
    if data.len() <= lag {
        return Vec::new();
    }
    (lag..data.len()).map(|t| data[t] - data[t - lag]).collect()
}

/// Least-squares autoregression of the given order, with constant.
/// Returns (coefficients, constant, residuals for t >= order).
fn estimate_ar(data: &[f64], order: usize) -> Option<(Vec<f64>, f64, Vec<f64>)> {
    let n = data.len();
    if n < order + 2 {
        return None;
    }

    let rows = n - order;
    let mut x_data = Vec::with_capacity(rows * (order + 1));
    for t in order..n {
        x_data.push(1.0);
        for i in 1..=order {
            x_data.push(data[t - i]);
        }
    }

    let x = DMatrix::from_row_slice(rows, order + 1, &x_data);
    let y = DVector::from_iterator(rows, data[order..].iter().copied());
    let beta = solve_ols(&x, &y)?;

    let residuals: Vec<f64> = (&y - &x * &beta).iter().copied().collect();
    let constant = beta[0];
    let coeffs = beta.iter().skip(1).copied().collect();
    Some((coeffs, constant, residuals))
}

/// OLS via the normal equations: β = (X'X)⁻¹ X'y.
fn solve_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let inv = xtx.try_inverse()?;
    Some(inv * xty)
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

fn z_score(confidence: f64) -> f64 {
    match confidence {
        c if c >= 0.99 => 2.576,
        c if c >= 0.95 => 1.96,
        c if c >= 0.90 => 1.645,
        c if c >= 0.80 => 1.282,
        _ => 1.96,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DailyBar;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
    }

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyBar {
                date: day(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 100,
            })
            .collect();
        PriceSeries {
            ticker: "BTC-USD".to_string(),
            bars,
        }
    }

    #[test]
    fn constant_history_forecasts_the_constant() {
        let series = series_from_closes(&vec![100.0; 30]);
        let forecast = forecast_column(&series, Column::Close, 5, 0.95).unwrap();

        assert_eq!(forecast.points.len(), 5);
        for point in &forecast.points {
            assert!((point.predicted - 100.0).abs() < 1.0);
            assert!(point.upper - point.lower < 10.0);
            assert!(point.lower <= point.predicted && point.predicted <= point.upper);
        }
    }

    #[test]
    fn linear_trend_is_extended() {
        let closes: Vec<f64> = (0..40).map(|t| 100.0 + 2.0 * t as f64).collect();
        let series = series_from_closes(&closes);
        let forecast = forecast_column(&series, Column::Close, 3, 0.95).unwrap();

        // a linear series differences to zero; the extension keeps the slope
        for (k, point) in forecast.points.iter().enumerate() {
            let expected = 100.0 + 2.0 * (40 + k) as f64;
            assert!((point.predicted - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn forecast_dates_follow_the_history() {
        let series = series_from_closes(&vec![100.0; 30]);
        let last = series.last_date().unwrap();
        let forecast = forecast_column(&series, Column::Close, 4, 0.95).unwrap();

        for (k, point) in forecast.points.iter().enumerate() {
            assert_eq!(point.date, last + Duration::days(k as i64 + 1));
        }
    }

    #[test]
    fn short_history_is_rejected_before_fitting() {
        let series = series_from_closes(&vec![100.0; MIN_OBSERVATIONS - 1]);
        let err = forecast_column(&series, Column::Close, 5, 0.95).unwrap_err();
        assert!(matches!(err, AnalyticsError::ModelFit(_)));
    }

    #[test]
    fn noisy_weekly_series_fits_and_bounds_widen() {
        // trend + weekly pattern + deterministic pseudo-noise
        let closes: Vec<f64> = (0..150)
            .map(|t| {
                let weekly = [5.0, 2.0, -1.0, -4.0, -2.0, 1.0, 3.0][t % 7];
                let noise = ((t * 7919) % 1000) as f64 / 500.0 - 1.0;
                200.0 + 0.5 * t as f64 + weekly + noise
            })
            .collect();
        let series = series_from_closes(&closes);
        let forecast = forecast_column(&series, Column::Close, 14, 0.95).unwrap();

        assert_eq!(forecast.points.len(), 14);
        let widths: Vec<f64> = forecast
            .points
            .iter()
            .map(|p| p.upper - p.lower)
            .collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9);
        }
        for point in &forecast.points {
            assert!(point.lower <= point.predicted && point.predicted <= point.upper);
            // stays in the neighbourhood of the recent history
            assert!(point.predicted > 150.0 && point.predicted < 400.0);
        }
    }

    #[test]
    fn difference_at_lag_one_and_seven() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&data, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert!(difference(&data, 7).is_empty());
    }
}
