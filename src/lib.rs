//! # Sales Explorer
//!
//! The filtering, aggregation and trend-forecasting core behind a sales
//! dashboard. The surrounding UI (widgets, charts, upload handling) is an
//! external collaborator: it hands this crate a CSV payload and loosely
//! typed filter strings, and renders the structures returned.
//!
//! ## Core Concepts
//!
//! - **Table**: immutable, ordered transaction rows sharing one schema.
//!   Every operation returns a new table or result structure.
//! - **Filter**: conjunctive per-field predicates. A malformed predicate
//!   value degrades to "no constraint on that field", never to an empty
//!   result or an aborted pass.
//! - **Aggregation**: group-by over categorical dimensions with a closed
//!   set of reducers (sum, mean, median, count), plus headline-metric
//!   specializations (totals, rates, top categories, baseline deltas).
//! - **Forecast**: degree-2 polynomial trend extrapolation over a per-day
//!   summed series.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_explorer::*;
//!
//! let table = read_csv(payload.as_bytes(), &ColumnMapping::default())?;
//!
//! let spec = FilterSpec {
//!     price: Some("150-300".to_string()),
//!     city: Some("Auckland".to_string()),
//!     ..FilterSpec::default()
//! };
//! let filtered = filter(&table, &spec);
//!
//! let metrics = HeadlineMetrics::compute(&table, &filtered.table)?;
//! let trend = forecast_measure(&filtered.table, Column::Profit, 30)?;
//! ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod ingestion;
pub mod metrics;
pub mod schema;
pub mod utils;

pub use aggregate::{aggregate, AggregationRequest, Group, GroupedResult, Reducer};
pub use error::{ExplorerError, Result};
pub use filter::{
    evaluate_predicates, filter, total_profit, Filtered, FilterSpec, Predicate, PredicateOutcome,
    SkippedPredicate,
};
pub use forecast::{daily_totals, forecast, forecast_measure, SeriesPoint, TREND_DEGREE};
pub use ingestion::{read_csv, write_csv};
pub use metrics::{
    category_rate, percent_delta, summed_total, top_category, HeadlineMetrics, TopCategory,
    RETURNED_LABEL,
};
pub use schema::{Column, ColumnMapping, Record, Table};
pub use utils::{format_purchase_date, parse_purchase_date, PURCHASE_DATE_FORMAT};
