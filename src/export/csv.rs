use crate::data::model::Value;
use crate::data::table::Table;

use super::ExportError;

/// Encode a table as UTF-8 CSV with a header row.
pub fn write_csv(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Parse CSV bytes back into a table, guessing each cell's type.
pub fn read_csv(bytes: &[u8]) -> Result<Table, ExportError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(Value::guess).collect());
    }
    Ok(table)
}

/// Full precision for floats so a reload gives the same numbers.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Float(v) if v.is_nan() => String::new(),
        Value::Float(v) => v.to_string(),
        other => other.to_string(),
    }
}
