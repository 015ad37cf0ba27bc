use crate::aggregate::{aggregate, AggregationRequest, Reducer};
use crate::error::Result;
use crate::schema::{Column, Table};
use serde::Serialize;
use std::cmp::Ordering;

/// The label used for returned transactions in the `return_status` column.
pub const RETURNED_LABEL: &str = "Returned";

/// Whole-table total of a numeric measure. NaN for a zero-row table.
pub fn summed_total(table: &Table, measure: Column) -> Result<f64> {
    let request = AggregationRequest::new(vec![], vec![measure], Reducer::Sum)?;
    let result = aggregate(table, &request);
    Ok(result
        .groups
        .first()
        .map(|g| g.values[0])
        .unwrap_or(f64::NAN))
}

/// The dimension value with the greatest summed measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategory {
    pub value: String,
    pub total: f64,
}

/// Find the dimension value with the greatest summed measure, e.g. the
/// payment method bringing in the most profit. `None` when the table has no
/// rows (or no group has a defined total).
pub fn top_category(
    table: &Table,
    dimension: Column,
    measure: Column,
) -> Result<Option<TopCategory>> {
    let request = AggregationRequest::new(vec![dimension], vec![measure], Reducer::Sum)?;
    let result = aggregate(table, &request);
    Ok(result
        .groups
        .into_iter()
        .filter(|g| !g.values[0].is_nan())
        .max_by(|a, b| {
            a.values[0]
                .partial_cmp(&b.values[0])
                .unwrap_or(Ordering::Equal)
        })
        .map(|g| TopCategory {
            total: g.values[0],
            value: g.key.into_iter().next().unwrap_or_default(),
        }))
}

/// Fraction of rows whose `dimension` cell equals `value` exactly.
/// `None` on a zero-row table rather than dividing by zero.
pub fn category_rate(table: &Table, dimension: Column, value: &str) -> Option<f64> {
    if table.is_empty() {
        return None;
    }
    let matching = table
        .records()
        .iter()
        .filter(|r| r.categorical(dimension) == Some(value))
        .count();
    Some(matching as f64 / table.len() as f64)
}

/// Percentage delta of `current` against `baseline`:
/// `(current / baseline - 1) * 100`.
///
/// A zero or non-finite baseline (and a non-finite current value) reports
/// `None` instead of an unguarded division.
pub fn percent_delta(current: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 || !baseline.is_finite() || !current.is_finite() {
        return None;
    }
    Some((current / baseline - 1.0) * 100.0)
}

/// The headline strip a dashboard renders over a filtered view: filtered
/// totals, the return rate, top categories, and percentage deltas against
/// the unfiltered baseline table.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineMetrics {
    pub total_profit: f64,
    pub total_units: f64,
    pub return_rate: Option<f64>,
    pub top_payment_method: Option<TopCategory>,
    pub top_item_type: Option<TopCategory>,
    pub profit_delta_pct: Option<f64>,
    pub units_delta_pct: Option<f64>,
}

impl HeadlineMetrics {
    /// Compute headline metrics for `filtered` against the `whole` baseline.
    /// The baseline is the unfiltered table the dataset was loaded as; a
    /// zero-row filtered table yields null lookups and deltas, not errors.
    pub fn compute(whole: &Table, filtered: &Table) -> Result<Self> {
        let total_profit = summed_total(filtered, Column::Profit)?;
        let total_units = summed_total(filtered, Column::UnitsSold)?;
        let baseline_profit = summed_total(whole, Column::Profit)?;
        let baseline_units = summed_total(whole, Column::UnitsSold)?;

        Ok(HeadlineMetrics {
            total_profit,
            total_units,
            return_rate: category_rate(filtered, Column::ReturnStatus, RETURNED_LABEL),
            top_payment_method: top_category(filtered, Column::PaymentMethod, Column::Profit)?,
            top_item_type: top_category(filtered, Column::ItemType, Column::Profit)?,
            profit_delta_pct: percent_delta(total_profit, baseline_profit),
            units_delta_pct: percent_delta(total_units, baseline_units),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, FilterSpec};
    use crate::ingestion::read_csv;
    use crate::schema::ColumnMapping;

    const FIXTURE: &str = "\
city,item_type,units_sold,return_status,payment_method,profit
Auckland,Electronics,12,Not Returned,Card,40
Wellington,Clothing,5,Returned,Cash,-10
Auckland,Electronics,20,Not Returned,Card,120
Auckland,Grocery,8,Not Returned,Cash,15
";

    fn fixture() -> Table {
        read_csv(FIXTURE.as_bytes(), &ColumnMapping::default()).unwrap()
    }

    #[test]
    fn test_summed_total() {
        let table = fixture();
        assert_eq!(summed_total(&table, Column::Profit).unwrap(), 165.0);
        assert_eq!(summed_total(&table, Column::UnitsSold).unwrap(), 45.0);
        assert!(summed_total(&table.with_records(Vec::new()), Column::Profit)
            .unwrap()
            .is_nan());
    }

    #[test]
    fn test_top_category() {
        let table = fixture();
        let top = top_category(&table, Column::PaymentMethod, Column::Profit)
            .unwrap()
            .unwrap();
        assert_eq!(top.value, "Card");
        assert_eq!(top.total, 160.0);

        let empty = table.with_records(Vec::new());
        assert!(top_category(&empty, Column::PaymentMethod, Column::Profit)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_category_rate() {
        let table = fixture();
        let rate = category_rate(&table, Column::ReturnStatus, RETURNED_LABEL).unwrap();
        assert!((rate - 0.25).abs() < 1e-12);

        let empty = table.with_records(Vec::new());
        assert_eq!(category_rate(&empty, Column::ReturnStatus, RETURNED_LABEL), None);
    }

    #[test]
    fn test_percent_delta() {
        assert_eq!(percent_delta(150.0, 100.0), Some(50.0));
        assert_eq!(percent_delta(50.0, 100.0), Some(-50.0));
        assert_eq!(percent_delta(10.0, 0.0), None);
        assert_eq!(percent_delta(f64::NAN, 100.0), None);
        assert_eq!(percent_delta(10.0, f64::NAN), None);
    }

    #[test]
    fn test_headline_metrics_against_baseline() {
        let table = fixture();
        let spec = FilterSpec {
            city: Some("Auckland".to_string()),
            ..FilterSpec::default()
        };
        let filtered = filter(&table, &spec);

        let metrics = HeadlineMetrics::compute(&table, &filtered.table).unwrap();
        assert_eq!(metrics.total_profit, 175.0);
        assert_eq!(metrics.total_units, 40.0);
        assert_eq!(metrics.return_rate, Some(0.0));
        assert_eq!(metrics.top_payment_method.unwrap().value, "Card");
        assert_eq!(metrics.top_item_type.unwrap().value, "Electronics");

        let expected_profit_delta = (175.0 / 165.0 - 1.0) * 100.0;
        assert!((metrics.profit_delta_pct.unwrap() - expected_profit_delta).abs() < 1e-12);
    }

    #[test]
    fn test_headline_metrics_on_zero_row_filter() {
        let table = fixture();
        let spec = FilterSpec {
            city: Some("Nowhere".to_string()),
            ..FilterSpec::default()
        };
        let filtered = filter(&table, &spec);

        let metrics = HeadlineMetrics::compute(&table, &filtered.table).unwrap();
        assert!(metrics.total_profit.is_nan());
        assert_eq!(metrics.return_rate, None);
        assert!(metrics.top_payment_method.is_none());
        assert_eq!(metrics.profit_delta_pct, None);
    }

    #[test]
    fn test_zero_baseline_reports_null_delta() {
        let csv = "city,units_sold,profit\nAuckland,3,0\nWellington,4,0\n";
        let table = read_csv(csv.as_bytes(), &ColumnMapping::default()).unwrap();
        let metrics = HeadlineMetrics::compute(&table, &table).unwrap();
        assert_eq!(metrics.profit_delta_pct, None);
        assert_eq!(metrics.units_delta_pct, Some(0.0));
    }
}
