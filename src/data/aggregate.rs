use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::filter::Subset;
use super::model::{ExpenseType, Measure, Record, Value, INSTITUTION_COLUMN, YEAR_COLUMN};
use super::table::Table;

/// Axis an aggregated view is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Year,
    Institution,
}

impl GroupBy {
    pub fn column_name(self) -> &'static str {
        match self {
            GroupBy::Year => YEAR_COLUMN,
            GroupBy::Institution => INSTITUTION_COLUMN,
        }
    }
}

/// One grouping key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Year(i32),
    Institution(String),
}

impl GroupKey {
    fn of(group_by: GroupBy, record: &Record) -> Self {
        match group_by {
            GroupBy::Year => GroupKey::Year(record.year),
            GroupBy::Institution => GroupKey::Institution(record.institution.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            GroupKey::Year(y) => Value::Integer(*y as i64),
            GroupKey::Institution(name) => Value::Text(name.clone()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Year(y) => write!(f, "{y}"),
            GroupKey::Institution(name) => f.write_str(name),
        }
    }
}

/// Sums of each measure for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    /// Aligned with [`AggregatedView::measures`].
    pub sums: Vec<f64>,
}

/// A table keyed by one grouping dimension with one summed column per measure.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedView {
    pub group_by: GroupBy,
    pub measures: Vec<Measure>,
    pub groups: Vec<Group>,
}

impl AggregatedView {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &GroupKey) -> Option<&[f64]> {
        self.groups
            .iter()
            .find(|g| &g.key == key)
            .map(|g| g.sums.as_slice())
    }

    /// Sum of one measure over every group.
    pub fn total(&self, measure: &Measure) -> f64 {
        match self.measures.iter().position(|m| m == measure) {
            Some(j) => self.groups.iter().map(|g| g.sums[j]).sum(),
            None => 0.0,
        }
    }

    /// `(key, value)` points for one measure, e.g. a chart series.
    pub fn series(&self, measure: &Measure) -> Vec<(GroupKey, f64)> {
        let Some(j) = self.measures.iter().position(|m| m == measure) else {
            return Vec::new();
        };
        self.groups.iter().map(|g| (g.key.clone(), g.sums[j])).collect()
    }

    /// One row per key: the key column followed by one column per measure.
    pub fn to_table(&self) -> Table {
        let mut columns = vec![self.group_by.column_name().to_string()];
        columns.extend(self.measures.iter().map(|m| m.name().to_string()));

        let mut table = Table::new(columns);
        for g in &self.groups {
            let mut row = vec![g.key.to_value()];
            row.extend(g.sums.iter().map(|&s| Value::Float(s)));
            table.push_row(row);
        }
        table
    }
}

/// Sum each measure per distinct key of `group_by`. Missing values count as
/// zero. Year keys come out ascending, institutions in first-seen order.
pub fn aggregate<'r, I>(records: I, group_by: GroupBy, measures: &[Measure]) -> AggregatedView
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for rec in records {
        let key = GroupKey::of(group_by, rec);
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                sums: vec![0.0; measures.len()],
            });
            groups.len() - 1
        });
        for (sum, m) in groups[slot].sums.iter_mut().zip(measures) {
            *sum += m.value_of(rec).unwrap_or(0.0);
        }
    }

    if group_by == GroupBy::Year {
        groups.sort_by(|a, b| a.key.cmp(&b.key));
    }

    AggregatedView {
        group_by,
        measures: measures.to_vec(),
        groups,
    }
}

/// The data page's per-year table: one column per year, a row for the
/// indicator (yearly mean) and a row for the expense column (yearly sum)
/// labelled `label`, usually the selected ministry.
pub fn indicator_table(
    subset: &Subset<'_>,
    indicator: &str,
    expense: ExpenseType,
    label: &str,
) -> Table {
    let means: BTreeMap<i32, f64> =
        mean_by_year(subset.records(), &Measure::Indicator(indicator.to_string()))
            .into_iter()
            .collect();
    let sums = aggregate(subset.records(), GroupBy::Year, &[expense.measure()]);

    let mut table = Table::new(vec![
        YEAR_COLUMN.to_string(),
        indicator.to_string(),
        label.to_string(),
    ]);
    for g in &sums.groups {
        if let GroupKey::Year(year) = g.key {
            table.push_row(vec![
                Value::Integer(year as i64),
                Value::from_option(means.get(&year).copied()),
                Value::Float(g.sums[0]),
            ]);
        }
    }
    table.transpose()
}

/// Per-year values of one measure, years ascending. Budget columns are
/// summed; indicators, which repeat on every institution's row, are averaged.
pub fn by_year<'r, I>(records: I, measure: &Measure) -> Vec<(i32, f64)>
where
    I: IntoIterator<Item = &'r Record>,
{
    if let Measure::Indicator(_) = measure {
        return mean_by_year(records, measure);
    }
    aggregate(records, GroupBy::Year, std::slice::from_ref(measure))
        .groups
        .into_iter()
        .filter_map(|g| match g.key {
            GroupKey::Year(y) => Some((y, g.sums[0])),
            GroupKey::Institution(_) => None,
        })
        .collect()
}

/// Per-institution [`by_year`] values of one measure: one `(institution, points)`
/// entry per institution in first-seen order, points sorted by year.
pub fn series_by_institution<'r, I>(records: I, measure: &Measure) -> Vec<(String, Vec<(i32, f64)>)>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut order: Vec<&'r str> = Vec::new();
    let mut buckets: HashMap<&'r str, Vec<&'r Record>> = HashMap::new();
    for rec in records {
        let bucket = buckets.entry(rec.institution.as_str()).or_default();
        if bucket.is_empty() {
            order.push(rec.institution.as_str());
        }
        bucket.push(rec);
    }

    order
        .into_iter()
        .map(|name| {
            let points = by_year(buckets.remove(name).unwrap_or_default(), measure);
            (name.to_string(), points)
        })
        .collect()
}

/// Yearly mean of one measure over the records that have a value, years
/// ascending. Used for indicators repeated across institutions, where a sum
/// would multiply the figure by the number of institutions.
pub fn mean_by_year<'r, I>(records: I, measure: &Measure) -> Vec<(i32, f64)>
where
    I: IntoIterator<Item = &'r Record>,
{
    let mut acc: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for rec in records {
        if let Some(v) = measure.value_of(rec) {
            let slot = acc.entry(rec.year).or_default();
            slot.0 += v;
            slot.1 += 1;
        }
    }
    acc.into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::compare::compare_totals;
    use crate::data::filter::{filter, FilterCriteria};
    use crate::data::model::Dataset;

    fn budget() -> [Measure; 2] {
        [Measure::Allocated, Measure::Executed]
    }

    #[test]
    fn scenario_two_ministries_one_year() {
        let ds = Dataset::from_records(
            vec![
                Record::new("MinA", 2020).with_budget(100.0, 80.0),
                Record::new("MinB", 2020).with_budget(50.0, 50.0),
            ],
            vec![],
        );
        let subset = filter(&ds, &FilterCriteria::years(2020, 2020));
        let view = aggregate(subset.records(), GroupBy::Institution, &budget());

        assert_eq!(
            view.get(&GroupKey::Institution("MinA".into())),
            Some(&[100.0, 80.0][..])
        );
        assert_eq!(
            view.get(&GroupKey::Institution("MinB".into())),
            Some(&[50.0, 50.0][..])
        );

        let cmp = compare_totals(&subset);
        assert_eq!(cmp.allocated, 150.0);
        assert_eq!(cmp.executed, 130.0);
        assert_eq!(cmp.gap.absolute, 20.0);
        assert!((cmp.gap.percentage - 13.33).abs() < 0.01);
    }

    #[test]
    fn empty_subset_gives_empty_view() {
        let view = aggregate(std::iter::empty::<&Record>(), GroupBy::Year, &budget());
        assert!(view.is_empty());
        assert!(view.to_table().is_empty());
    }

    #[test]
    fn missing_values_count_as_zero() {
        let mut rec = Record::new("MinA", 2020).with_budget(10.0, 5.0);
        rec.executed = None;
        let other = Record::new("MinA", 2020).with_budget(1.0, f64::NAN);
        let view = aggregate([&rec, &other], GroupBy::Year, &budget());
        assert_eq!(view.groups[0].sums, vec![11.0, 0.0]);
    }

    #[test]
    fn key_order_years_sorted_institutions_first_seen() {
        let records = vec![
            Record::new("MinZ", 2022).with_budget(1.0, 1.0),
            Record::new("MinA", 2020).with_budget(1.0, 1.0),
            Record::new("MinZ", 2021).with_budget(1.0, 1.0),
        ];
        let by_year = aggregate(&records, GroupBy::Year, &budget());
        let years: Vec<_> = by_year.groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(years, vec!["2020", "2021", "2022"]);

        let by_inst = aggregate(&records, GroupBy::Institution, &budget());
        let names: Vec<_> = by_inst.groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(names, vec!["MinZ", "MinA"]);
        assert_eq!(by_inst.groups[0].sums, vec![2.0, 2.0]);
    }

    #[test]
    fn aggregating_a_single_group_again_is_idempotent() {
        let records = vec![
            Record::new("MinA", 2020)
                .with_budget(3.0, 2.0)
                .with_indicator("PIB", 1.5),
            Record::new("MinA", 2021).with_budget(4.0, 1.0),
        ];
        let measures = [
            Measure::Allocated,
            Measure::Executed,
            Measure::Indicator("PIB".into()),
        ];
        let first = aggregate(&records, GroupBy::Institution, &measures);
        assert_eq!(first.groups.len(), 1);

        // Rebuild the group as a record and aggregate it again.
        let sums = &first.groups[0].sums;
        let again_input = vec![Record::new("MinA", 2020)
            .with_budget(sums[0], sums[1])
            .with_indicator("PIB", sums[2])];
        let again = aggregate(&again_input, GroupBy::Institution, &measures);
        assert_eq!(again.groups, first.groups);
    }

    #[test]
    fn indicator_table_has_one_column_per_year() {
        let ds = Dataset::from_records(
            vec![
                Record::new("MinA", 2021)
                    .with_budget(20.0, 18.0)
                    .with_indicator("Inflation", 4.0),
                Record::new("MinA", 2020)
                    .with_budget(10.0, 9.0)
                    .with_indicator("Inflation", 3.0),
                Record::new("MinB", 2020).with_budget(99.0, 99.0),
            ],
            vec!["Inflation".into()],
        );
        let subset = filter(&ds, &FilterCriteria::all(&ds).institution("MinA"));
        let table = indicator_table(&subset, "Inflation", ExpenseType::Executed, "MinA");

        assert_eq!(table.columns, vec![YEAR_COLUMN, "2020", "2021"]);
        assert_eq!(
            table.rows,
            vec![
                vec![
                    Value::Text("Inflation".into()),
                    Value::Float(3.0),
                    Value::Float(4.0)
                ],
                vec![
                    Value::Text("MinA".into()),
                    Value::Float(9.0),
                    Value::Float(18.0)
                ],
            ]
        );
    }

    #[test]
    fn indicator_row_is_not_multiplied_by_ministries() {
        let ds = Dataset::from_records(
            vec![
                Record::new("MinA", 2020)
                    .with_budget(100.0, 80.0)
                    .with_indicator("Taux d'inflation", 3.0),
                Record::new("MinB", 2020)
                    .with_budget(50.0, 50.0)
                    .with_indicator("Taux d'inflation", 3.0),
            ],
            vec!["Taux d'inflation".into()],
        );
        let subset = filter(&ds, &FilterCriteria::all(&ds));
        let table = indicator_table(&subset, "Taux d'inflation", ExpenseType::Allocated, "Tous");

        assert_eq!(
            table.rows,
            vec![
                vec![Value::Text("Taux d'inflation".into()), Value::Float(3.0)],
                vec![Value::Text("Tous".into()), Value::Float(150.0)],
            ]
        );
    }

    #[test]
    fn by_year_sums_budgets_and_averages_indicators() {
        let records = vec![
            Record::new("MinA", 2020).with_budget(1.0, 1.0).with_indicator("PIB", 10.0),
            Record::new("MinB", 2020).with_budget(2.0, 2.0).with_indicator("PIB", 10.0),
            Record::new("MinA", 2021).with_budget(4.0, 4.0).with_indicator("PIB", 12.0),
        ];
        assert_eq!(by_year(&records, &Measure::Allocated), vec![(2020, 3.0), (2021, 4.0)]);
        assert_eq!(
            by_year(&records, &Measure::Indicator("PIB".into())),
            vec![(2020, 10.0), (2021, 12.0)]
        );
    }

    #[test]
    fn totals_and_series() {
        let records = vec![
            Record::new("MinA", 2020).with_budget(1.0, 0.5),
            Record::new("MinA", 2021).with_budget(2.0, 1.5),
        ];
        let view = aggregate(&records, GroupBy::Year, &budget());
        assert_eq!(view.total(&Measure::Executed), 2.0);
        assert_eq!(
            view.series(&Measure::Allocated),
            vec![(GroupKey::Year(2020), 1.0), (GroupKey::Year(2021), 2.0)]
        );
        assert!(view.series(&Measure::Indicator("x".into())).is_empty());
    }

    #[test]
    fn series_per_institution_sorted_by_year() {
        let records = vec![
            Record::new("MinB", 2021).with_budget(2.0, 0.0),
            Record::new("MinA", 2021).with_budget(5.0, 0.0),
            Record::new("MinB", 2020).with_budget(1.0, 0.0),
        ];
        let series = series_by_institution(&records, &Measure::Allocated);
        assert_eq!(
            series,
            vec![
                ("MinB".to_string(), vec![(2020, 1.0), (2021, 2.0)]),
                ("MinA".to_string(), vec![(2021, 5.0)]),
            ]
        );
    }

    #[test]
    fn mean_skips_missing_values() {
        let pib = Measure::Indicator("PIB".into());
        let records = vec![
            Record::new("MinA", 2020).with_indicator("PIB", 2.0),
            Record::new("MinB", 2020).with_indicator("PIB", 4.0),
            Record::new("MinC", 2020),
            Record::new("MinA", 2019).with_indicator("PIB", 1.0),
        ];
        assert_eq!(mean_by_year(&records, &pib), vec![(2019, 1.0), (2020, 3.0)]);
    }
}
