use std::collections::BTreeSet;

use super::model::{
    Dataset, ExpenseType, Measure, Record, Value, INSTITUTION_COLUMN, YEAR_COLUMN,
};
use super::table::Table;

// ---------------------------------------------------------------------------
// Filter criteria: built fresh for every interaction
// ---------------------------------------------------------------------------

/// Which institutions a request is about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InstitutionSelection {
    /// No constraint.
    #[default]
    Any,
    Single(String),
    /// Membership; an empty set means "no constraint", like an untouched
    /// multi-select.
    Set(BTreeSet<String>),
}

impl InstitutionSelection {
    /// Build a selection from a multi-select's current values.
    pub fn from_selected<I, S>(selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = selected.into_iter().map(Into::into).collect();
        if set.is_empty() {
            InstitutionSelection::Any
        } else {
            InstitutionSelection::Set(set)
        }
    }

    pub fn matches(&self, institution: &str) -> bool {
        match self {
            InstitutionSelection::Any => true,
            InstitutionSelection::Single(name) => name == institution,
            InstitutionSelection::Set(names) => names.is_empty() || names.contains(institution),
        }
    }
}

/// Immutable request parameters for one view of the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive lower bound.
    pub year_min: i32,
    /// Inclusive upper bound.
    pub year_max: i32,
    /// Expense column the view is about, if any. Does not drop rows.
    pub expense_type: Option<ExpenseType>,
    pub institutions: InstitutionSelection,
    /// Indicator columns the view is about. Does not drop rows.
    pub indicators: Vec<String>,
}

impl FilterCriteria {
    pub fn years(year_min: i32, year_max: i32) -> Self {
        FilterCriteria {
            year_min,
            year_max,
            expense_type: None,
            institutions: InstitutionSelection::Any,
            indicators: Vec::new(),
        }
    }

    /// Criteria covering the whole dataset.
    pub fn all(dataset: &Dataset) -> Self {
        let (lo, hi) = dataset.year_range().unwrap_or((0, 0));
        Self::years(lo, hi)
    }

    pub fn institution(mut self, name: impl Into<String>) -> Self {
        self.institutions = InstitutionSelection::Single(name.into());
        self
    }

    pub fn institutions(mut self, selection: InstitutionSelection) -> Self {
        self.institutions = selection;
        self
    }

    pub fn expense(mut self, expense: Option<ExpenseType>) -> Self {
        self.expense_type = expense;
        self
    }

    pub fn indicators(mut self, indicators: Vec<String>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.year >= self.year_min
            && record.year <= self.year_max
            && self.institutions.matches(&record.institution)
    }

    /// Measures requested by the criteria: the expense column first, then
    /// the indicators.
    pub fn measures(&self) -> Vec<Measure> {
        self.expense_type
            .map(ExpenseType::measure)
            .into_iter()
            .chain(self.indicators.iter().cloned().map(Measure::Indicator))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Subset: rows of the dataset passing a filter
// ---------------------------------------------------------------------------

/// A filtered projection of a [`Dataset`]. Borrows the dataset and keeps
/// source order.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    pub dataset: &'a Dataset,
    pub indices: Vec<usize>,
}

impl<'a> Subset<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = &self.dataset.records;
        self.indices.iter().map(move |&i| &records[i])
    }

    /// Project the rows into a display table. `None` keeps every column
    /// (institution, year, both expense columns, then the indicators).
    pub fn to_table(&self, measures: Option<&[Measure]>) -> Table {
        let all;
        let measures = match measures {
            Some(m) => m,
            None => {
                all = self.dataset.measures();
                &all
            }
        };

        let mut columns = vec![INSTITUTION_COLUMN.to_string(), YEAR_COLUMN.to_string()];
        columns.extend(measures.iter().map(|m| m.name().to_string()));

        let mut table = Table::new(columns);
        for rec in self.records() {
            let mut row = vec![
                Value::Text(rec.institution.clone()),
                Value::Integer(rec.year as i64),
            ];
            row.extend(measures.iter().map(|m| Value::from_option(m.value_of(rec))));
            table.push_row(row);
        }
        table
    }
}

/// Return the records whose year lies in `[year_min, year_max]` and whose
/// institution matches the selection.
///
/// Out-of-range bounds, an inverted range or an unknown institution give an
/// empty subset; nothing here fails.
pub fn filter<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> Subset<'a> {
    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect();

    log::debug!(
        "filter {}..={} {:?}: {} of {} rows",
        criteria.year_min,
        criteria.year_max,
        criteria.institutions,
        indices.len(),
        dataset.len()
    );

    Subset { dataset, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic() -> Dataset {
        let mut records = Vec::new();
        for year in 2015..=2022 {
            for (i, name) in ["MinA", "MinB", "MinC"].iter().enumerate() {
                let base = (year - 2015) as f64 * 10.0 + i as f64;
                records.push(
                    Record::new(*name, year)
                        .with_budget(base + 100.0, base + 90.0)
                        .with_indicator("PIB", base),
                );
            }
        }
        Dataset::from_records(records, vec!["PIB".into()])
    }

    #[test]
    fn year_bounds_are_inclusive_for_every_interval() {
        let ds = synthetic();
        for lo in 2015..=2022 {
            for hi in lo..=2022 {
                let subset = filter(&ds, &FilterCriteria::years(lo, hi));
                assert!(subset.records().all(|r| r.year >= lo && r.year <= hi));
                assert_eq!(subset.len(), ((hi - lo + 1) * 3) as usize);
            }
        }
    }

    #[test]
    fn out_of_range_or_inverted_is_empty() {
        let ds = synthetic();
        assert!(filter(&ds, &FilterCriteria::years(1990, 2000)).is_empty());
        assert!(filter(&ds, &FilterCriteria::years(2020, 2018)).is_empty());
    }

    #[test]
    fn unknown_institution_is_empty_not_an_error() {
        let ds = synthetic();
        let subset = filter(&ds, &FilterCriteria::all(&ds).institution("Min Typo"));
        assert!(subset.is_empty());
    }

    #[test]
    fn single_and_set_selection() {
        let ds = synthetic();
        let one = filter(&ds, &FilterCriteria::years(2020, 2020).institution("MinB"));
        assert_eq!(one.len(), 1);
        assert_eq!(one.records().next().map(|r| r.year), Some(2020));

        let two = filter(
            &ds,
            &FilterCriteria::years(2020, 2021)
                .institutions(InstitutionSelection::from_selected(["MinA", "MinC"])),
        );
        assert_eq!(two.len(), 4);
        assert!(two.records().all(|r| r.institution != "MinB"));
    }

    #[test]
    fn empty_multiselect_means_everything() {
        let ds = synthetic();
        let sel = InstitutionSelection::from_selected(Vec::<String>::new());
        assert_eq!(sel, InstitutionSelection::Any);
        assert!(InstitutionSelection::Set(BTreeSet::new()).matches("MinA"));
        assert_eq!(filter(&ds, &FilterCriteria::all(&ds).institutions(sel)).len(), ds.len());
    }

    #[test]
    fn expense_and_indicators_do_not_drop_rows() {
        let mut records = vec![Record::new("MinA", 2020).with_budget(1.0, 1.0)];
        records.push(Record::new("MinB", 2020));
        let ds = Dataset::from_records(records, vec!["PIB".into()]);
        let criteria = FilterCriteria::all(&ds)
            .expense(Some(ExpenseType::Executed))
            .indicators(vec!["PIB".into()]);
        assert_eq!(filter(&ds, &criteria).len(), 2);
        assert_eq!(
            criteria.measures(),
            vec![Measure::Executed, Measure::Indicator("PIB".into())]
        );
    }

    #[test]
    fn identity_projection_keeps_all_columns() {
        let ds = synthetic();
        let table = filter(&ds, &FilterCriteria::years(2015, 2015)).to_table(None);
        assert_eq!(
            table.columns,
            vec![
                INSTITUTION_COLUMN,
                YEAR_COLUMN,
                "Budget Dépense Courante",
                "Exécution Dépense",
                "PIB"
            ]
        );
        assert_eq!(table.len(), 3);
    }
}
