use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{
    Dataset, Record, Value, ALLOCATED_COLUMN, EXECUTED_COLUMN, INSTITUTION_COLUMN,
    REQUIRED_COLUMNS, YEAR_COLUMN,
};
use super::table::Table;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    #[error("indicator column '{0}' is not in the sheet")]
    UnknownIndicator(String),
    #[error("no usable rows (every row lacks an institution or a year)")]
    NoRows,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load and bind the expenditure dataset. Dispatch by extension.
///
/// `indicators` is the explicit indicator column list; `None` takes every
/// column that is not one of the four required ones, in sheet order.
pub fn load_dataset(path: &Path, indicators: Option<&[String]>) -> Result<Dataset> {
    let raw = load_table(path).with_context(|| format!("loading {}", path.display()))?;
    let dataset = bind(&raw, indicators)?;
    log::info!(
        "Loaded {} rows, {} institutions, years {:?}, indicators {:?}",
        dataset.len(),
        dataset.institutions.len(),
        dataset.year_range(),
        dataset.indicator_columns
    );
    Ok(dataset)
}

/// Read any supported file into an untyped table.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – first sheet, first row is the header
/// * `.csv`     – header row, comma separated
/// * `.parquet` – flat scalar columns
/// * `.json`    – `[{ "Année": 2020, ... }, ...]` (pandas `orient='records'`)
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => load_workbook(path),
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => {
            let bytes = std::fs::read(path).context("reading CSV file")?;
            Ok(crate::export::csv::read_csv(&bytes)?)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Schema binding
// ---------------------------------------------------------------------------

/// Turn an untyped table into records. Missing required columns are fatal;
/// rows without an institution or a year are skipped with a warning.
pub fn bind(raw: &Table, indicators: Option<&[String]>) -> Result<Dataset, SchemaError> {
    let index_of = |name: &str| {
        raw.column_index(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    };
    let inst_idx = index_of(INSTITUTION_COLUMN)?;
    let year_idx = index_of(YEAR_COLUMN)?;
    let alloc_idx = index_of(ALLOCATED_COLUMN)?;
    let exec_idx = index_of(EXECUTED_COLUMN)?;

    let indicator_columns: Vec<String> = match indicators {
        Some(list) => {
            if let Some(missing) = list.iter().find(|c| raw.column_index(c).is_none()) {
                return Err(SchemaError::UnknownIndicator(missing.clone()));
            }
            list.to_vec()
        }
        None => raw
            .columns
            .iter()
            .filter(|c| !REQUIRED_COLUMNS.contains(&c.as_str()))
            .cloned()
            .collect(),
    };
    let indicator_idx: Vec<(usize, &String)> = indicator_columns
        .iter()
        .filter_map(|c| Some((raw.column_index(c)?, c)))
        .collect();

    let mut records = Vec::with_capacity(raw.len());
    let mut skipped = 0usize;

    for row in &raw.rows {
        let institution = match &row[inst_idx] {
            Value::Text(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Integer(_) | Value::Float(_) => row[inst_idx].to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let Some(year) = row[year_idx].as_i64().and_then(|y| i32::try_from(y).ok()) else {
            skipped += 1;
            continue;
        };

        let mut values = BTreeMap::new();
        for (idx, name) in &indicator_idx {
            if let Some(v) = row[*idx].as_f64() {
                values.insert((*name).clone(), v);
            }
        }

        records.push(Record {
            institution,
            year,
            allocated: row[alloc_idx].as_f64(),
            executed: row[exec_idx].as_f64(),
            indicators: values,
        });
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} rows without an institution or a year");
    }
    if records.is_empty() && !raw.is_empty() {
        return Err(SchemaError::NoRows);
    }

    Ok(Dataset::from_records(records, indicator_columns))
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no sheets")?
        .context("reading first sheet")?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        bail!("first sheet is empty");
    };
    let mut table = Table::new(header.iter().map(|c| cell_to_value(c).to_string()).collect());

    for row in rows {
        table.push_row(row.iter().map(cell_to_value).collect());
    }
    Ok(table)
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::String(s) => Value::Text(s.clone()),
        Data::Bool(b) => Value::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
        Data::DateTime(dt) => Value::Float(dt.as_f64()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "Institutions/Ministères": "Santé", "Année": 2020, "Budget Dépense Courante": 12.5, ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let mut table = Table::new(columns);
    for obj in objects {
        let row = table
            .columns
            .iter()
            .map(|c| obj.get(c).map(json_to_value).unwrap_or(Value::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file, e.g. written by `df.to_parquet()` or by the
/// `generate_sample` binary.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(columns);

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|col| extract_value(col, row))
                .collect();
            table.push_row(values);
        }
    }
    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => Value::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Value::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(Value::Null, |a| Value::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(Value::Null, |a| Value::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(Value::Null, |a| Value::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(Value::Null, |a| Value::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(Value::Null, |a| Value::Text(a.value(row).to_string())),
        other => Value::Text(format!("{other:?}")),
    }
}
