use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const INSTITUTION_COLUMN: &str = "Institutions/Ministères";
pub const YEAR_COLUMN: &str = "Année";
pub const ALLOCATED_COLUMN: &str = "Budget Dépense Courante";
pub const EXECUTED_COLUMN: &str = "Exécution Dépense";

/// Columns every source workbook must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    INSTITUTION_COLUMN,
    YEAR_COLUMN,
    ALLOCATED_COLUMN,
    EXECUTED_COLUMN,
];

// ---------------------------------------------------------------------------
// Value – a single cell of a raw or derived table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes found in the source sheet.
/// Totally ordered: nulls first, then numbers by value, then text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

// -- Manual Eq/Ord/Hash so Value can sit in ordered collections --

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            // Integer(2) sorts before Float(2.0): equal value, distinct cells.
            (Value::Integer(a), Value::Float(b)) => {
                (*a as f64).total_cmp(b).then(Ordering::Less)
            }
            (Value::Float(a), Value::Integer(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => Ok(()),
        }
    }
}

impl Value {
    /// Numeric view of the cell; NaN floats count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if v.is_nan() => None,
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Whole-number view, accepting floats with no fractional part
    /// (spreadsheets store years as floats).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn from_option(v: Option<f64>) -> Self {
        v.map(Value::Float).unwrap_or(Value::Null)
    }

    /// Guess the type of a text cell (CSV input).
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
        Value::Text(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Measures – the value columns a view can be built from
// ---------------------------------------------------------------------------

/// Which expense column is meant when the user picks a "type de dépense".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseType {
    Allocated,
    Executed,
}

impl ExpenseType {
    pub const ALL: [ExpenseType; 2] = [ExpenseType::Allocated, ExpenseType::Executed];

    pub fn column_name(self) -> &'static str {
        match self {
            ExpenseType::Allocated => ALLOCATED_COLUMN,
            ExpenseType::Executed => EXECUTED_COLUMN,
        }
    }

    pub fn measure(self) -> Measure {
        match self {
            ExpenseType::Allocated => Measure::Allocated,
            ExpenseType::Executed => Measure::Executed,
        }
    }
}

/// A numeric column of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measure {
    Allocated,
    Executed,
    Indicator(String),
}

impl Measure {
    /// Header of the source column this measure reads.
    pub fn name(&self) -> &str {
        match self {
            Measure::Allocated => ALLOCATED_COLUMN,
            Measure::Executed => EXECUTED_COLUMN,
            Measure::Indicator(name) => name,
        }
    }

    /// Value of this measure for one record; `None` when missing.
    pub fn value_of(&self, record: &Record) -> Option<f64> {
        let v = match self {
            Measure::Allocated => record.allocated,
            Measure::Executed => record.executed,
            Measure::Indicator(name) => record.indicators.get(name).copied(),
        };
        v.filter(|x| !x.is_nan())
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Record – one (institution, year) observation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub institution: String,
    pub year: i32,
    /// Allocated budget, millions of local currency.
    pub allocated: Option<f64>,
    /// Executed budget, same unit.
    pub executed: Option<f64>,
    /// Indicator columns: column_name → value. Missing cells are absent.
    pub indicators: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(institution: impl Into<String>, year: i32) -> Self {
        Record {
            institution: institution.into(),
            year,
            allocated: None,
            executed: None,
            indicators: BTreeMap::new(),
        }
    }

    pub fn with_budget(mut self, allocated: f64, executed: f64) -> Self {
        self.allocated = Some(allocated);
        self.executed = Some(executed);
        self
    }

    pub fn with_indicator(mut self, name: impl Into<String>, value: f64) -> Self {
        self.indicators.insert(name.into(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed lookups. Immutable once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All records in source order.
    pub records: Vec<Record>,
    /// Named indicator columns, in source order.
    pub indicator_columns: Vec<String>,
    /// Distinct institutions in first-seen order.
    pub institutions: Vec<String>,
    /// Distinct years, ascending.
    pub years: BTreeSet<i32>,
}

impl Dataset {
    /// Build lookups from the loaded records.
    pub fn from_records(records: Vec<Record>, indicator_columns: Vec<String>) -> Self {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut institutions = Vec::new();
        let mut years = BTreeSet::new();

        for rec in &records {
            if seen.insert(rec.institution.as_str()) {
                institutions.push(rec.institution.clone());
            }
            years.insert(rec.year);
        }
        Dataset {
            records,
            indicator_columns,
            institutions,
            years,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Observed `(min, max)` year, `None` on an empty dataset.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        Some((*self.years.first()?, *self.years.last()?))
    }

    /// Institutions that have at least one non-missing value for `expense`,
    /// first-seen order.
    pub fn institutions_with(&self, expense: ExpenseType) -> Vec<String> {
        let measure = expense.measure();
        let mut seen = BTreeSet::new();
        self.records
            .iter()
            .filter(|r| measure.value_of(r).is_some())
            .filter(|r| seen.insert(r.institution.as_str()))
            .map(|r| r.institution.clone())
            .collect()
    }

    /// Every measure the dataset can be aggregated on.
    pub fn measures(&self) -> Vec<Measure> {
        let mut out = vec![Measure::Allocated, Measure::Executed];
        out.extend(self.indicator_columns.iter().cloned().map(Measure::Indicator));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_ordering_mixes_integers_and_floats() {
        let mut set = BTreeSet::new();
        set.insert(Value::Float(2.5));
        set.insert(Value::Integer(2));
        set.insert(Value::Text("a".into()));
        set.insert(Value::Null);
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Value::Null,
                Value::Integer(2),
                Value::Float(2.5),
                Value::Text("a".into())
            ]
        );
    }

    #[test]
    fn equal_values_agree_with_ordering() {
        use std::collections::HashSet;

        assert_ne!(Value::Integer(2), Value::Float(2.0));
        assert!(Value::Integer(2) < Value::Float(2.0));
        assert!(Value::Float(1.5) < Value::Integer(2));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));

        let set: HashSet<Value> = [Value::Float(1.0), Value::Float(1.0), Value::Integer(1), Value::Null]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn years_stored_as_floats_are_whole_numbers() {
        assert_eq!(Value::Float(2021.0).as_i64(), Some(2021));
        assert_eq!(Value::Float(2021.5).as_i64(), None);
        assert_eq!(Value::Text(" 2019 ".into()).as_i64(), Some(2019));
    }

    #[test]
    fn nan_indicator_is_missing() {
        let rec = Record::new("MinA", 2020).with_indicator("PIB", f64::NAN);
        assert_eq!(Measure::Indicator("PIB".into()).value_of(&rec), None);
    }

    #[test]
    fn dataset_lookups() {
        let ds = Dataset::from_records(
            vec![
                Record::new("MinB", 2021).with_budget(1.0, 1.0),
                Record::new("MinA", 2019),
                Record::new("MinB", 2020).with_budget(2.0, 2.0),
            ],
            vec![],
        );
        assert_eq!(ds.institutions, vec!["MinB", "MinA"]);
        assert_eq!(ds.year_range(), Some((2019, 2021)));
        assert_eq!(ds.institutions_with(ExpenseType::Executed), vec!["MinB"]);
    }
}
