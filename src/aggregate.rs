use crate::error::{ExplorerError, Result};
use crate::schema::{Column, Record, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// The closed set of reduction functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Sum,
    Mean,
    Median,
    Count,
}

impl FromStr for Reducer {
    type Err = ExplorerError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Reducer::Sum),
            "mean" => Ok(Reducer::Mean),
            "median" => Ok(Reducer::Median),
            "count" => Ok(Reducer::Count),
            _ => Err(ExplorerError::UnknownReducer(name.to_string())),
        }
    }
}

impl Reducer {
    /// Collapse one group. `values` are the group's non-null cells for the
    /// measure; `rows` is the group's row count, which is what `Count`
    /// reports regardless of null cells. An empty `values` slice reduces to
    /// NaN for sum, mean and median.
    fn reduce(&self, values: &[f64], rows: usize) -> f64 {
        match self {
            Reducer::Sum => {
                if values.is_empty() {
                    f64::NAN
                } else {
                    values.iter().sum()
                }
            }
            Reducer::Mean => {
                if values.is_empty() {
                    f64::NAN
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }
            Reducer::Median => median(values),
            Reducer::Count => rows as f64,
        }
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// A validated aggregation request: grouping dimensions, measure columns and
/// the reducer. Shape problems (a non-categorical dimension, a non-numeric
/// measure, an unknown reducer name) are rejected here, not at execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationRequest {
    dimensions: Vec<Column>,
    measures: Vec<Column>,
    reducer: Reducer,
}

impl AggregationRequest {
    pub fn new(dimensions: Vec<Column>, measures: Vec<Column>, reducer: Reducer) -> Result<Self> {
        for dimension in &dimensions {
            if !dimension.is_categorical() {
                return Err(ExplorerError::NonCategoricalDimension(*dimension));
            }
        }
        for measure in &measures {
            if !measure.is_numeric() {
                return Err(ExplorerError::NonNumericMeasure(*measure));
            }
        }
        Ok(AggregationRequest {
            dimensions,
            measures,
            reducer,
        })
    }

    /// Build a request from a reducer held as a plain name.
    pub fn parse(dimensions: Vec<Column>, measures: Vec<Column>, reducer: &str) -> Result<Self> {
        Self::new(dimensions, measures, reducer.parse()?)
    }

    pub fn dimensions(&self) -> &[Column] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[Column] {
        &self.measures
    }

    pub fn reducer(&self) -> Reducer {
        self.reducer
    }
}

/// One reduced group: the dimension value tuple, its row count, and one
/// reduced value per requested measure (same order as the request).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: Vec<String>,
    pub rows: usize,
    pub values: Vec<f64>,
}

/// Aggregation output. Groups appear in first-encounter order so results are
/// reproducible run to run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedResult {
    pub dimensions: Vec<Column>,
    pub measures: Vec<Column>,
    pub reducer: Reducer,
    pub groups: Vec<Group>,
}

impl GroupedResult {
    /// Look up a group by its dimension value tuple.
    pub fn group(&self, key: &[&str]) -> Option<&Group> {
        self.groups
            .iter()
            .find(|g| g.key.iter().map(String::as_str).eq(key.iter().copied()))
    }
}

/// Group `table` by the request's dimensions and reduce each measure.
///
/// An empty dimension list produces a single whole-table group with an empty
/// key. A zero-row table produces no groups.
pub fn aggregate(table: &Table, request: &AggregationRequest) -> GroupedResult {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut buckets: Vec<(Vec<String>, Vec<&Record>)> = Vec::new();

    for record in table.records() {
        let key: Vec<String> = request
            .dimensions
            .iter()
            .map(|d| record.categorical(*d).unwrap_or_default().to_string())
            .collect();
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            buckets.push((key, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(record);
    }

    let groups = buckets
        .into_iter()
        .map(|(key, members)| {
            let values: Vec<f64> = request
                .measures
                .iter()
                .map(|measure| {
                    let cells: Vec<f64> =
                        members.iter().filter_map(|r| r.numeric(*measure)).collect();
                    request.reducer.reduce(&cells, members.len())
                })
                .collect();
            Group {
                key,
                rows: members.len(),
                values,
            }
        })
        .collect();

    GroupedResult {
        dimensions: request.dimensions.clone(),
        measures: request.measures.clone(),
        reducer: request.reducer,
        groups,
    }
}
