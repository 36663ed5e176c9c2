use rust_xlsxwriter::{Format, Workbook};

use crate::data::model::Value;
use crate::data::table::Table;

use super::ExportError;

/// Encode a table as a single-sheet workbook with a bold header row.
pub fn write_xlsx(table: &Table, sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name)?;

    for (c, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, name, &header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Value::Integer(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Value::Float(v) if v.is_finite() => {
                    sheet.write_number(r, c, *v)?;
                }
                Value::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Value::Float(_) | Value::Null => {}
            }
        }
    }
    sheet.autofit();

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_table;

    #[test]
    fn workbook_reloads_through_the_loader() {
        let mut table = Table::new(vec!["Année".into(), "Exécution Dépense".into(), "Note".into()]);
        table.push_row(vec![
            Value::Integer(2020),
            Value::Float(80.5),
            Value::Text("ok".into()),
        ]);
        table.push_row(vec![Value::Integer(2021), Value::Null, Value::Null]);

        let bytes = write_xlsx(&table, "Données").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.xlsx");
        crate::export::save(&path, &bytes).unwrap();

        let back = load_table(&path).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.len(), 2);
        assert_eq!(back.rows[0][0].as_f64(), Some(2020.0));
        assert_eq!(back.rows[0][1].as_f64(), Some(80.5));
        assert_eq!(back.rows[0][2], Value::Text("ok".into()));
        assert_eq!(back.rows[1][1], Value::Null);
    }

    #[test]
    fn invalid_sheet_name_is_an_error() {
        let table = Table::new(vec!["a".into()]);
        assert!(matches!(
            write_xlsx(&table, "bad/name"),
            Err(ExportError::Xlsx(_))
        ));
    }
}
