use chrono::NaiveDate;

/// The fixed purchase-date format: day-month-year, e.g. `31-01-2023`.
pub const PURCHASE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Parse a purchase-date cell against the fixed format.
/// Values that do not match yield `None` rather than an error.
pub fn parse_purchase_date(cell: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(cell.trim(), PURCHASE_DATE_FORMAT).ok()
}

/// Render a date back into the fixed purchase-date format.
pub fn format_purchase_date(date: NaiveDate) -> String {
    date.format(PURCHASE_DATE_FORMAT).to_string()
}

/// Numeric reading of a cell. Blank or non-numeric cells yield `None`.
pub fn parse_cell_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
