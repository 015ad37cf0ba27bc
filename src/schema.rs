use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The canonical transaction columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    DateOfPurchase,
    Gender,
    Age,
    UnitsSold,
    Price,
    ItemType,
    City,
    DiscountApplied,
    ReturnStatus,
    PaymentMethod,
    Profit,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::DateOfPurchase,
        Column::Gender,
        Column::Age,
        Column::UnitsSold,
        Column::Price,
        Column::ItemType,
        Column::City,
        Column::DiscountApplied,
        Column::ReturnStatus,
        Column::PaymentMethod,
        Column::Profit,
    ];

    /// Canonical snake_case name, used for export headers.
    pub fn name(&self) -> &'static str {
        match self {
            Column::DateOfPurchase => "date_of_purchase",
            Column::Gender => "gender",
            Column::Age => "age",
            Column::UnitsSold => "units_sold",
            Column::Price => "price",
            Column::ItemType => "item_type",
            Column::City => "city",
            Column::DiscountApplied => "discount_applied",
            Column::ReturnStatus => "return_status",
            Column::PaymentMethod => "payment_method",
            Column::Profit => "profit",
        }
    }

    /// Columns usable as grouping dimensions and equality filters.
    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            Column::Gender
                | Column::ItemType
                | Column::City
                | Column::DiscountApplied
                | Column::ReturnStatus
                | Column::PaymentMethod
        )
    }

    /// Columns with a numeric reading.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Column::Age | Column::UnitsSold | Column::Price | Column::Profit
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Alias table from external header names to canonical columns, resolved once
/// at ingestion so the rest of the crate never sees header spelling.
///
/// The default mapping accepts both header conventions observed in uploaded
/// datasets: lower_snake (`date_of_purchase`, `units_sold`, ...) and
/// PascalCase (`Date`, `UnitsSold`, `Discount`, ...). Callers with a third
/// convention register their own aliases.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    aliases: HashMap<String, Column>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        let mut mapping = ColumnMapping::empty();
        for (header, column) in [
            ("date_of_purchase", Column::DateOfPurchase),
            ("Date", Column::DateOfPurchase),
            ("gender", Column::Gender),
            ("Gender", Column::Gender),
            ("age", Column::Age),
            ("Age", Column::Age),
            ("units_sold", Column::UnitsSold),
            ("UnitsSold", Column::UnitsSold),
            ("price", Column::Price),
            ("Price", Column::Price),
            ("item_type", Column::ItemType),
            ("ItemType", Column::ItemType),
            ("city", Column::City),
            ("City", Column::City),
            ("discount_applied", Column::DiscountApplied),
            ("Discount", Column::DiscountApplied),
            ("return_status", Column::ReturnStatus),
            ("Return", Column::ReturnStatus),
            ("payment_method", Column::PaymentMethod),
            ("Payment", Column::PaymentMethod),
            ("profit", Column::Profit),
            ("Profit", Column::Profit),
        ] {
            mapping.add_alias(header, column);
        }
        mapping
    }
}

impl ColumnMapping {
    /// A mapping with no aliases registered.
    pub fn empty() -> Self {
        ColumnMapping {
            aliases: HashMap::new(),
        }
    }

    /// Register an additional header alias for a column.
    pub fn add_alias(&mut self, header: impl Into<String>, column: Column) -> &mut Self {
        self.aliases.insert(header.into(), column);
        self
    }

    /// Resolve an external header name to its canonical column.
    pub fn resolve(&self, header: &str) -> Option<Column> {
        self.aliases.get(header.trim()).copied()
    }
}

/// One transaction row after normalization.
///
/// Numeric cells that failed coercion are `None`. `profit` defaults to 0.0
/// when absent or unparseable. Categorical cells keep the raw text, empty
/// when the cell was blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date_of_purchase: Option<NaiveDate>,
    pub gender: String,
    pub age: Option<f64>,
    pub units_sold: Option<f64>,
    pub price: Option<f64>,
    pub item_type: String,
    pub city: String,
    pub discount_applied: String,
    pub return_status: String,
    pub payment_method: String,
    pub profit: f64,
}

impl Record {
    /// The cell text of a categorical column.
    /// `None` when the column is not categorical.
    pub fn categorical(&self, column: Column) -> Option<&str> {
        match column {
            Column::Gender => Some(&self.gender),
            Column::ItemType => Some(&self.item_type),
            Column::City => Some(&self.city),
            Column::DiscountApplied => Some(&self.discount_applied),
            Column::ReturnStatus => Some(&self.return_status),
            Column::PaymentMethod => Some(&self.payment_method),
            _ => None,
        }
    }

    /// The numeric reading of a column. `None` when the cell failed coercion
    /// or the column has no numeric reading.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Age => self.age,
            Column::UnitsSold => self.units_sold,
            Column::Price => self.price,
            Column::Profit => Some(self.profit),
            _ => None,
        }
    }
}

/// An ordered collection of records sharing one schema.
///
/// `columns` lists the canonical columns actually present in the source
/// payload, in source order. Export preserves that order, and predicates over
/// a column not listed here are skipped rather than applied. Tables are
/// immutable: every transformation returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<Column>, records: Vec<Record>) -> Self {
        Table { columns, records }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the source payload carried this column.
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// A new table with the same schema and the given subset of rows.
    pub fn with_records(&self, records: Vec<Record>) -> Self {
        Table {
            columns: self.columns.clone(),
            records,
        }
    }
}
