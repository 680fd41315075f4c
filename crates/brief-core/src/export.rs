//! Text encoders for downloading a brief.

use crate::record::BriefRecord;
use crate::RecordError;

/// Separator between items of a multi-value field in CSV exports.
pub const CSV_LIST_SEPARATOR: &str = "; ";

/// Pretty-printed JSON, lists kept as arrays.
pub fn to_json(record: &BriefRecord) -> Result<String, RecordError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Quote one CSV cell: wrap in double quotes, double any inner quote.
pub fn csv_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Header row of field names in registry order, then one data row.
pub fn to_csv(record: &BriefRecord) -> String {
    let headers: Vec<&str> = record.iter().map(|(field, _)| field.name()).collect();
    let values: Vec<String> = record
        .iter()
        .map(|(_, value)| csv_cell(&value.join(CSV_LIST_SEPARATOR)))
        .collect();
    format!("{}\n{}", headers.join(","), values.join(","))
}
