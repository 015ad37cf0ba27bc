use crate::schema::{Column, Record, Table};
use crate::utils::{parse_cell_number, parse_purchase_date};
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

/// The raw filter surface exactly as the caller supplies it: every field
/// optional, range and date fields as plain strings parsed per-predicate.
///
/// Categorical fields are exact-match values. `age`, `units_sold` and `price`
/// take a `"<min>-<max>"` range. `date_of_purchase` takes `"DD-MM-YYYY"` for
/// an exact day or `"DD-MM-YYYY to DD-MM-YYYY"` for an inclusive range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub units_sold: Option<String>,
    pub price: Option<String>,
    pub item_type: Option<String>,
    pub city: Option<String>,
    pub discount_applied: Option<String>,
    pub return_status: Option<String>,
    pub date_of_purchase: Option<String>,
    pub payment_method: Option<String>,
}

impl FilterSpec {
    /// True when no field carries a constraint.
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.age.is_none()
            && self.units_sold.is_none()
            && self.price.is_none()
            && self.item_type.is_none()
            && self.city.is_none()
            && self.discount_applied.is_none()
            && self.return_status.is_none()
            && self.date_of_purchase.is_none()
            && self.payment_method.is_none()
    }
}

/// A single compiled constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-sensitive exact match on a categorical column.
    Equals { column: Column, value: String },
    /// Inclusive numeric range. Rows whose cell has no numeric reading are
    /// excluded while this predicate is active.
    NumericRange { column: Column, min: f64, max: f64 },
    /// Exact-day match on the purchase date.
    DateEquals(NaiveDate),
    /// Inclusive range on the purchase date.
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// A predicate that could not be applied, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPredicate {
    pub column: Column,
    pub reason: String,
}

/// The outcome of evaluating one filter field. Parse failures and absent
/// columns become `Skipped`; they never abort the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateOutcome {
    Applied(Predicate),
    Skipped(SkippedPredicate),
}

/// Output of a filter pass.
#[derive(Debug, Clone)]
pub struct Filtered {
    /// The retained rows, in input order, sharing the input schema.
    pub table: Table,
    /// Sum of profit over the retained rows. `None` when the source payload
    /// had no profit column.
    pub total_profit: Option<f64>,
    /// Predicates that were dropped, in evaluation order.
    pub skipped: Vec<SkippedPredicate>,
}

/// Apply a filter specification to a table.
///
/// Predicates compose conjunctively and are evaluated independently: a
/// predicate whose input fails to parse degrades to "no constraint on that
/// field" instead of failing the pass or emptying the result. Row order is
/// preserved and the input table is untouched.
pub fn filter(table: &Table, spec: &FilterSpec) -> Filtered {
    let mut predicates = Vec::new();
    let mut skipped = Vec::new();
    for outcome in evaluate_predicates(spec, table) {
        match outcome {
            PredicateOutcome::Applied(predicate) => predicates.push(predicate),
            PredicateOutcome::Skipped(details) => {
                warn!("Skipping {} filter: {}", details.column, details.reason);
                skipped.push(details);
            }
        }
    }

    let records: Vec<Record> = table
        .records()
        .iter()
        .filter(|record| predicates.iter().all(|p| matches(record, p)))
        .cloned()
        .collect();

    let result = table.with_records(records);
    let total_profit = total_profit(&result);

    Filtered {
        table: result,
        total_profit,
        skipped,
    }
}

/// Sum of profit over a table, `None` when the profit column is absent.
/// Unparseable profit cells already defaulted to 0.0 at ingestion.
pub fn total_profit(table: &Table) -> Option<f64> {
    if !table.has_column(Column::Profit) {
        return None;
    }
    Some(table.records().iter().map(|r| r.profit).sum())
}

/// Evaluate each supplied filter field into a [`PredicateOutcome`], in the
/// fixed order: gender, age, units_sold, price, item_type, city,
/// discount_applied, return_status, date_of_purchase, payment_method.
pub fn evaluate_predicates(spec: &FilterSpec, table: &Table) -> Vec<PredicateOutcome> {
    let mut outcomes = Vec::new();
    push_equality(&mut outcomes, table, Column::Gender, &spec.gender);
    push_range(&mut outcomes, table, Column::Age, &spec.age);
    push_range(&mut outcomes, table, Column::UnitsSold, &spec.units_sold);
    push_range(&mut outcomes, table, Column::Price, &spec.price);
    push_equality(&mut outcomes, table, Column::ItemType, &spec.item_type);
    push_equality(&mut outcomes, table, Column::City, &spec.city);
    push_equality(
        &mut outcomes,
        table,
        Column::DiscountApplied,
        &spec.discount_applied,
    );
    push_equality(
        &mut outcomes,
        table,
        Column::ReturnStatus,
        &spec.return_status,
    );
    push_date(&mut outcomes, table, &spec.date_of_purchase);
    push_equality(
        &mut outcomes,
        table,
        Column::PaymentMethod,
        &spec.payment_method,
    );
    outcomes
}

fn skip(column: Column, reason: impl Into<String>) -> PredicateOutcome {
    PredicateOutcome::Skipped(SkippedPredicate {
        column,
        reason: reason.into(),
    })
}

fn push_equality(
    outcomes: &mut Vec<PredicateOutcome>,
    table: &Table,
    column: Column,
    value: &Option<String>,
) {
    let Some(value) = value else { return };
    if !table.has_column(column) {
        outcomes.push(skip(column, "column not present in table"));
        return;
    }
    outcomes.push(PredicateOutcome::Applied(Predicate::Equals {
        column,
        value: value.clone(),
    }));
}

fn push_range(
    outcomes: &mut Vec<PredicateOutcome>,
    table: &Table,
    column: Column,
    raw: &Option<String>,
) {
    let Some(raw) = raw else { return };
    if !table.has_column(column) {
        outcomes.push(skip(column, "column not present in table"));
        return;
    }
    match parse_numeric_range(raw) {
        Some((min, max)) => outcomes.push(PredicateOutcome::Applied(Predicate::NumericRange {
            column,
            min,
            max,
        })),
        None => outcomes.push(skip(
            column,
            format!("invalid range '{}': expected '<min>-<max>'", raw),
        )),
    }
}

fn push_date(outcomes: &mut Vec<PredicateOutcome>, table: &Table, raw: &Option<String>) {
    let Some(raw) = raw else { return };
    if !table.has_column(Column::DateOfPurchase) {
        outcomes.push(skip(Column::DateOfPurchase, "column not present in table"));
        return;
    }
    match parse_date_constraint(raw) {
        Some(predicate) => outcomes.push(PredicateOutcome::Applied(predicate)),
        None => outcomes.push(skip(
            Column::DateOfPurchase,
            format!(
                "invalid date filter '{}': expected 'DD-MM-YYYY' or 'DD-MM-YYYY to DD-MM-YYYY'",
                raw
            ),
        )),
    }
}

/// Split a `"min-max"` range on its single separator. A missing bound, an
/// extra separator or a non-numeric bound yields `None`.
fn parse_numeric_range(raw: &str) -> Option<(f64, f64)> {
    let mut parts = raw.split('-');
    let min = parse_cell_number(parts.next()?)?;
    let max = parse_cell_number(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((min, max))
}

/// A date filter is a range when the literal token `to` is present, otherwise
/// an exact-day match. Both bounds use the fixed `DD-MM-YYYY` format; any
/// parse failure drops the whole date predicate.
fn parse_date_constraint(raw: &str) -> Option<Predicate> {
    if raw.contains("to") {
        let (start_raw, end_raw) = raw.split_once(" to ")?;
        let start = parse_purchase_date(start_raw)?;
        let end = parse_purchase_date(end_raw)?;
        Some(Predicate::DateRange { start, end })
    } else {
        parse_purchase_date(raw).map(Predicate::DateEquals)
    }
}

fn matches(record: &Record, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Equals { column, value } => {
            record.categorical(*column) == Some(value.as_str())
        }
        Predicate::NumericRange { column, min, max } => record
            .numeric(*column)
            .is_some_and(|v| v >= *min && v <= *max),
        Predicate::DateEquals(date) => record.date_of_purchase == Some(*date),
        Predicate::DateRange { start, end } => record
            .date_of_purchase
            .is_some_and(|d| d >= *start && d <= *end),
    }
}
