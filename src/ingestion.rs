use crate::error::Result;
use crate::schema::{Column, ColumnMapping, Record, Table};
use crate::utils::{format_purchase_date, parse_cell_number, parse_purchase_date};
use log::debug;
use std::io::{Read, Write};

/// Parse a CSV payload into a normalized [`Table`].
///
/// The only fatal failure is a payload that cannot be read as tabular data at
/// all (rows that do not share the header's field count, or text that is not
/// valid UTF-8). Individual cells degrade instead: the purchase-date column is
/// coerced
/// against the fixed `DD-MM-YYYY` format with non-matching values becoming
/// null, numeric cells coerce to null on failure, and `profit` falls back to
/// 0.0 when absent or unparseable. No row is rejected for bad cell content.
///
/// Headers are resolved through `mapping` once; unmapped columns are ignored.
pub fn read_csv<R: Read>(reader: R, mapping: &ColumnMapping) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();

    // One slot per source column; a later duplicate of an already-seen
    // canonical column is ignored.
    let mut columns: Vec<Column> = Vec::new();
    let mut slots: Vec<Option<Column>> = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let resolved = mapping.resolve(header).filter(|c| !columns.contains(c));
        if let Some(column) = resolved {
            columns.push(column);
        }
        slots.push(resolved);
    }

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let mut record = Record::default();
        for (idx, slot) in slots.iter().enumerate() {
            let (Some(column), Some(cell)) = (slot, row.get(idx)) else {
                continue;
            };
            assign_cell(&mut record, *column, cell);
        }
        records.push(record);
    }

    debug!(
        "Ingested {} records across {} mapped columns",
        records.len(),
        columns.len()
    );

    Ok(Table::new(columns, records))
}

fn assign_cell(record: &mut Record, column: Column, cell: &str) {
    match column {
        Column::DateOfPurchase => record.date_of_purchase = parse_purchase_date(cell),
        Column::Gender => record.gender = cell.to_string(),
        Column::Age => record.age = parse_cell_number(cell),
        Column::UnitsSold => record.units_sold = parse_cell_number(cell),
        Column::Price => record.price = parse_cell_number(cell),
        Column::ItemType => record.item_type = cell.to_string(),
        Column::City => record.city = cell.to_string(),
        Column::DiscountApplied => record.discount_applied = cell.to_string(),
        Column::ReturnStatus => record.return_status = cell.to_string(),
        Column::PaymentMethod => record.payment_method = cell.to_string(),
        Column::Profit => record.profit = parse_cell_number(cell).unwrap_or(0.0),
    }
}

/// Export a table as CSV.
///
/// Column order follows the source payload, headers are the canonical
/// snake_case names, and dates render back in the fixed `DD-MM-YYYY` format,
/// so the output re-ingests to row-for-row equal data.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.columns().iter().map(|c| c.name()))?;

    for record in table.records() {
        let row: Vec<String> = table
            .columns()
            .iter()
            .map(|column| render_cell(record, *column))
            .collect();
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn render_cell(record: &Record, column: Column) -> String {
    match column {
        Column::DateOfPurchase => record
            .date_of_purchase
            .map(format_purchase_date)
            .unwrap_or_default(),
        Column::Age => render_number(record.age),
        Column::UnitsSold => render_number(record.units_sold),
        Column::Price => render_number(record.price),
        Column::Profit => record.profit.to_string(),
        other => record.categorical(other).unwrap_or_default().to_string(),
    }
}

fn render_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SNAKE_CSV: &str = "\
date_of_purchase,gender,age,units_sold,price,item_type,city,discount_applied,return_status,payment_method,profit
01-01-2023,Male,34,12,100,Electronics,Auckland,Yes,Not Returned,Card,40
02-01-2023,Female,28,5,200,Clothing,Wellington,No,Returned,Cash,-10
";

    const PASCAL_CSV: &str = "\
Date,Gender,Age,UnitsSold,Price,ItemType,City,Discount,Return,Payment,Profit
01-01-2023,Male,34,12,100,Electronics,Auckland,Yes,Not Returned,Card,40
02-01-2023,Female,28,5,200,Clothing,Wellington,No,Returned,Cash,-10
";

    #[test]
    fn test_read_snake_case_headers() {
        let table = read_csv(SNAKE_CSV.as_bytes(), &ColumnMapping::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns().len(), 11);

        let first = &table.records()[0];
        assert_eq!(
            first.date_of_purchase,
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert_eq!(first.gender, "Male");
        assert_eq!(first.units_sold, Some(12.0));
        assert_eq!(first.profit, 40.0);
    }

    #[test]
    fn test_pascal_case_headers_ingest_identically() {
        let mapping = ColumnMapping::default();
        let snake = read_csv(SNAKE_CSV.as_bytes(), &mapping).unwrap();
        let pascal = read_csv(PASCAL_CSV.as_bytes(), &mapping).unwrap();
        assert_eq!(snake, pascal);
    }

    #[test]
    fn test_bad_cells_degrade_per_field() {
        let csv = "\
date_of_purchase,age,profit
2023/01/01,thirty,oops
05-06-2023,41,12.5
";
        let table = read_csv(csv.as_bytes(), &ColumnMapping::default()).unwrap();
        assert_eq!(table.len(), 2);

        let bad = &table.records()[0];
        assert_eq!(bad.date_of_purchase, None);
        assert_eq!(bad.age, None);
        assert_eq!(bad.profit, 0.0);

        let good = &table.records()[1];
        assert_eq!(good.date_of_purchase, NaiveDate::from_ymd_opt(2023, 6, 5));
        assert_eq!(good.age, Some(41.0));
        assert_eq!(good.profit, 12.5);
    }

    #[test]
    fn test_unmapped_columns_are_ignored() {
        let csv = "city,order_id,profit\nAuckland,A-17,5\n";
        let table = read_csv(csv.as_bytes(), &ColumnMapping::default()).unwrap();
        assert_eq!(table.columns(), &[Column::City, Column::Profit]);
        assert!(!table.has_column(Column::Gender));
        assert_eq!(table.records()[0].city, "Auckland");
    }

    #[test]
    fn test_missing_columns_are_absent_not_defaulted() {
        let csv = "city,price\nAuckland,100\n";
        let table = read_csv(csv.as_bytes(), &ColumnMapping::default()).unwrap();
        assert!(!table.has_column(Column::Profit));
        // The record still carries the field default; presence is tracked on
        // the table, not the record.
        assert_eq!(table.records()[0].profit, 0.0);
    }

    #[test]
    fn test_unreadable_payload_is_fatal() {
        // An unbalanced quote inside a record is a structural CSV error.
        let csv = "city,price\n\"Auckland,100\nWellington,50\n";
        let result = read_csv(csv.as_bytes(), &ColumnMapping::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_round_trip() {
        let mapping = ColumnMapping::default();
        let table = read_csv(SNAKE_CSV.as_bytes(), &mapping).unwrap();

        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let again = read_csv(out.as_slice(), &mapping).unwrap();

        assert_eq!(table, again);
    }

    #[test]
    fn test_export_preserves_source_column_order() {
        let csv = "profit,city\n5,Auckland\n";
        let table = read_csv(csv.as_bytes(), &ColumnMapping::default()).unwrap();

        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("profit,city"));
    }
}
