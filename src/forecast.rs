use crate::error::{ExplorerError, Result};
use crate::schema::{Column, Table};
use chrono::{Days, NaiveDate};
use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::collections::BTreeMap;

/// Polynomial degree of the trend fit.
pub const TREND_DEGREE: usize = 2;

/// One point of an observed or predicted daily series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sum a measure per purchase date, ascending by date. Rows without a valid
/// purchase date are dropped; null measure cells contribute nothing.
pub fn daily_totals(table: &Table, measure: Column) -> Vec<SeriesPoint> {
    let mut totals: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for record in table.records() {
        let Some(date) = record.date_of_purchase else {
            continue;
        };
        let Some(value) = record.numeric(measure) else {
            continue;
        };
        *totals.entry(date).or_insert(0.0) += value;
    }
    totals
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect()
}

/// Extrapolate a date-ascending series `horizon` periods ahead with a
/// degree-2 polynomial least-squares fit.
///
/// The regression runs against the synthetic index `0..n`; predictions are
/// evaluated at `n..n + horizon` and dated on consecutive days after the last
/// observation, whatever the series' actual cadence was. This is a plain
/// trend extrapolator: no prediction intervals, no seasonality, no frequency
/// inference.
///
/// A horizon of 0 returns an empty sequence. Fewer than three points cannot
/// support a degree-2 fit and fail with `InsufficientData`.
pub fn forecast(series: &[SeriesPoint], horizon: usize) -> Result<Vec<SeriesPoint>> {
    let n = series.len();
    let needed = TREND_DEGREE + 1;
    if n < needed {
        return Err(ExplorerError::InsufficientData {
            degree: TREND_DEGREE,
            needed,
            got: n,
        });
    }
    if horizon == 0 {
        return Ok(Vec::new());
    }

    let coefficients = fit_polynomial(series)?;
    debug!(
        "Fitted trend over {} points: {:?}, extrapolating {} periods",
        n, coefficients, horizon
    );

    let last_date = series[n - 1].date;
    let mut predictions = Vec::with_capacity(horizon);
    for step in 0..horizon {
        let date = last_date
            .checked_add_days(Days::new(step as u64 + 1))
            .ok_or_else(|| {
                ExplorerError::DateError(format!(
                    "forecast date overflow {} days after {}",
                    step + 1,
                    last_date
                ))
            })?;
        let x = (n + step) as f64;
        predictions.push(SeriesPoint {
            date,
            value: evaluate(&coefficients, x),
        });
    }

    Ok(predictions)
}

/// Group a table's measure into daily totals and extrapolate the trend.
pub fn forecast_measure(
    table: &Table,
    measure: Column,
    horizon: usize,
) -> Result<Vec<SeriesPoint>> {
    forecast(&daily_totals(table, measure), horizon)
}

/// Ordinary least squares of the series values against Vandermonde features
/// `[1, x, x^2]` of the synthetic 0-based index.
fn fit_polynomial(series: &[SeriesPoint]) -> Result<[f64; 3]> {
    let n = series.len();
    let features = DMatrix::from_fn(n, TREND_DEGREE + 1, |row, col| {
        (row as f64).powi(col as i32)
    });
    let targets = DVector::from_iterator(n, series.iter().map(|p| p.value));

    let solution = features
        .svd(true, true)
        .solve(&targets, f64::EPSILON)
        .map_err(|e| ExplorerError::Regression(e.to_string()))?;

    Ok([solution[0], solution[1], solution[2]])
}

fn evaluate(coefficients: &[f64; 3], x: f64) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .map(|(power, c)| c * x.powi(power as i32))
        .sum()
}
