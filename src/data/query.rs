use super::aggregate::by_year;
use super::filter::{filter, FilterCriteria};
use super::model::{Dataset, Measure, Value, YEAR_COLUMN};
use super::table::Table;

const ALLOCATED_KEYWORDS: [&str; 4] = ["budget", "alloué", "alloue", "allocated"];
const EXECUTED_KEYWORDS: [&str; 5] = ["exécution", "execution", "exécuté", "executed", "dépensé"];

#[derive(Debug, Clone, PartialEq)]
pub enum QueryAnswer {
    /// Two columns: year and the matched measure.
    Table { measure: Measure, table: Table },
    NotFound(String),
}

/// Answer a free-text question by keyword containment.
///
/// Indicator names are matched before the expense keywords so that an
/// indicator whose name contains "budget" wins over the expense column.
/// An institution named in the question restricts the rows; 4-digit years
/// restrict the range. Indicators are averaged per year, budget columns
/// summed.
pub fn answer(dataset: &Dataset, question: &str) -> QueryAnswer {
    let q = question.to_lowercase();

    let Some(measure) = find_measure(dataset, &q) else {
        return QueryAnswer::NotFound(format!(
            "Aucun indicateur reconnu dans « {question} ». Indicateurs disponibles : {}",
            dataset.indicator_columns.join(", ")
        ));
    };

    let mut criteria = FilterCriteria::all(dataset);
    let years = find_years(&q);
    if let (Some(&lo), Some(&hi)) = (years.iter().min(), years.iter().max()) {
        criteria.year_min = lo;
        criteria.year_max = hi;
    }
    if let Some(name) = dataset
        .institutions
        .iter()
        .find(|name| q.contains(&name.to_lowercase()))
    {
        criteria = criteria.institution(name.clone());
    }

    let subset = filter(dataset, &criteria);
    if subset.is_empty() {
        return QueryAnswer::NotFound(format!(
            "Aucune donnée pour « {measure} » sur {}–{}",
            criteria.year_min, criteria.year_max
        ));
    }

    let mut table = Table::new(vec![YEAR_COLUMN.to_string(), measure.name().to_string()]);
    for (year, v) in by_year(subset.records(), &measure) {
        table.push_row(vec![Value::Integer(year as i64), Value::Float(v)]);
    }
    if table.is_empty() {
        return QueryAnswer::NotFound(format!("Aucune valeur de « {measure} » pour cette sélection"));
    }
    log::info!("query {question:?} matched {measure} ({} years)", table.len());
    QueryAnswer::Table { measure, table }
}

fn find_measure(dataset: &Dataset, q: &str) -> Option<Measure> {
    if let Some(name) = dataset
        .indicator_columns
        .iter()
        .find(|name| q.contains(&name.to_lowercase()))
    {
        return Some(Measure::Indicator(name.clone()));
    }
    if EXECUTED_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Some(Measure::Executed);
    }
    if ALLOCATED_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Some(Measure::Allocated);
    }
    None
}

/// Standalone 4-digit numbers between 1900 and 2100.
fn find_years(q: &str) -> Vec<i32> {
    q.split(|c: char| !c.is_ascii_digit())
        .filter(|tok| tok.len() == 4)
        .filter_map(|tok| tok.parse::<i32>().ok())
        .filter(|y| (1900..=2100).contains(y))
        .collect()
}
