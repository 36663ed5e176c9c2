use serde::{Deserialize, Serialize};

use super::model::Value;

/// A rectangular table of cells with a header row. Every view handed to a
/// presentation or export adapter ends up as one of these.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Pivot the table: the first column's cells become the new header and
    /// every other column becomes a row labelled by its old header.
    ///
    /// ```text
    ///  Année | PIB | MinA            | 2019 | 2020
    ///  2019  | 1.0 | 10     ──►  PIB  | 1.0  | 2.0
    ///  2020  | 2.0 | 20          MinA | 10   | 20
    /// ```
    pub fn transpose(&self) -> Table {
        let Some((key_header, value_headers)) = self.columns.split_first() else {
            return Table::default();
        };

        let mut columns = Vec::with_capacity(self.rows.len() + 1);
        columns.push(key_header.clone());
        columns.extend(self.rows.iter().map(|r| r[0].to_string()));

        let rows = value_headers
            .iter()
            .enumerate()
            .map(|(j, header)| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(Value::Text(header.clone()));
                row.extend(self.rows.iter().map(|r| r[j + 1].clone()));
                row
            })
            .collect();

        Table { columns, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpose_turns_keys_into_headers() {
        let mut t = Table::new(vec!["Année".into(), "PIB".into(), "MinA".into()]);
        t.push_row(vec![Value::Integer(2019), Value::Float(1.0), Value::Float(10.0)]);
        t.push_row(vec![Value::Integer(2020), Value::Float(2.0), Value::Float(20.0)]);

        let p = t.transpose();
        assert_eq!(p.columns, vec!["Année", "2019", "2020"]);
        assert_eq!(
            p.rows[1],
            vec![Value::Text("MinA".into()), Value::Float(10.0), Value::Float(20.0)]
        );
    }

    #[test]
    fn transpose_of_empty_table_keeps_header_label() {
        let t = Table::new(vec!["Année".into(), "PIB".into()]);
        let p = t.transpose();
        assert_eq!(p.columns, vec!["Année"]);
        assert_eq!(p.rows, vec![vec![Value::Text("PIB".into())]]);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![Value::Integer(1)]);
        assert_eq!(t.rows[0], vec![Value::Integer(1), Value::Null]);
    }
}
