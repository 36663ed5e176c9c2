use std::collections::BTreeSet;
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{FilterCriteria, InstitutionSelection};
use crate::data::model::{Dataset, ExpenseType, Measure};
use crate::data::query::{answer, QueryAnswer};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Data,
    Visualisation,
    Analysis,
    Query,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Data, Page::Visualisation, Page::Analysis, Page::Query];

    pub fn title(self) -> &'static str {
        match self {
            Page::Data => "Data",
            Page::Visualisation => "Visualisation",
            Page::Analysis => "Analyse",
            Page::Query => "Question",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTab {
    Comparison,
    Regression,
}

/// What the comparison tab compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonChoice {
    Nothing,
    AllInstitutions,
    Institution(String),
}

impl ComparisonChoice {
    pub fn label(&self) -> &str {
        match self {
            ComparisonChoice::Nothing => "Aucun ministère",
            ComparisonChoice::AllInstitutions => "Budget et Exécution",
            ComparisonChoice::Institution(name) => name,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Widget values live here;
/// every view is computed from a [`FilterCriteria`] built from them.
pub struct AppState {
    /// Loaded once at startup, read-only.
    pub dataset: Arc<Dataset>,
    pub config: DashboardConfig,
    pub colors: ColorMap,
    pub page: Page,

    /// Year range sliders shared by the Data, Visualisation and regression views.
    pub year_min: i32,
    pub year_max: i32,

    // ---- Data page ----
    pub data_expense: ExpenseType,
    pub data_ministry: Option<String>,
    pub data_indicator: Option<String>,

    // ---- Visualisation page ----
    pub viz_expense: Option<ExpenseType>,
    pub viz_institutions: BTreeSet<String>,
    pub viz_indicator: Option<String>,
    pub viz_year: i32,

    // ---- Analysis page ----
    pub analysis_tab: AnalysisTab,
    pub comparison_choice: ComparisonChoice,
    pub comparison_year: i32,
    pub predictors: Vec<Measure>,
    pub response: Measure,

    // ---- Query page ----
    pub question: String,
    pub answer: Option<QueryAnswer>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Dataset, config: DashboardConfig) -> Self {
        let (lo, hi) = dataset.year_range().unwrap_or((0, 0));
        let colors = ColorMap::new(&dataset.institutions);
        let data_expense = ExpenseType::Allocated;
        let data_ministry = dataset.institutions_with(data_expense).into_iter().next();
        let data_indicator = dataset.indicator_columns.first().cloned();
        let predictors = data_indicator
            .clone()
            .map(Measure::Indicator)
            .into_iter()
            .collect();

        AppState {
            dataset: Arc::new(dataset),
            config,
            colors,
            page: Page::Data,
            year_min: lo,
            year_max: hi,
            data_expense,
            data_ministry,
            data_indicator,
            viz_expense: None,
            viz_institutions: BTreeSet::new(),
            viz_indicator: None,
            viz_year: lo,
            analysis_tab: AnalysisTab::Comparison,
            comparison_choice: ComparisonChoice::Nothing,
            comparison_year: lo,
            predictors,
            response: Measure::Executed,
            question: String::new(),
            answer: None,
            status_message: None,
        }
    }

    pub fn data_criteria(&self) -> FilterCriteria {
        let criteria = FilterCriteria::years(self.year_min, self.year_max)
            .expense(Some(self.data_expense))
            .indicators(self.data_indicator.iter().cloned().collect());
        match &self.data_ministry {
            Some(name) => criteria.institution(name.clone()),
            None => criteria,
        }
    }

    pub fn viz_criteria(&self) -> FilterCriteria {
        // Ministries can only be picked once an expense type is chosen.
        let selection = if self.viz_expense.is_some() {
            InstitutionSelection::from_selected(self.viz_institutions.iter().cloned())
        } else {
            InstitutionSelection::Any
        };
        FilterCriteria::years(self.year_min, self.year_max)
            .expense(self.viz_expense)
            .institutions(selection)
            .indicators(self.viz_indicator.iter().cloned().collect())
    }

    /// Criteria for the per-year ministry comparison on the visualisation
    /// page. An empty selection compares every ministry.
    pub fn viz_year_criteria(&self) -> FilterCriteria {
        FilterCriteria::years(self.viz_year, self.viz_year)
            .expense(self.viz_expense)
            .institutions(InstitutionSelection::Set(self.viz_institutions.clone()))
    }

    /// `None` while nothing is selected.
    pub fn comparison_criteria(&self) -> Option<FilterCriteria> {
        let criteria = FilterCriteria::years(self.comparison_year, self.comparison_year);
        match &self.comparison_choice {
            ComparisonChoice::Nothing => None,
            ComparisonChoice::AllInstitutions => Some(criteria),
            ComparisonChoice::Institution(name) => Some(criteria.institution(name.clone())),
        }
    }

    pub fn regression_criteria(&self) -> FilterCriteria {
        FilterCriteria::years(self.year_min, self.year_max)
    }

    pub fn toggle_institution(&mut self, name: &str) {
        if !self.viz_institutions.remove(name) {
            self.viz_institutions.insert(name.to_string());
        }
    }

    pub fn toggle_predictor(&mut self, measure: &Measure) {
        if let Some(pos) = self.predictors.iter().position(|m| m == measure) {
            self.predictors.remove(pos);
        } else {
            self.predictors.push(measure.clone());
        }
    }

    /// Keep the year range ordered after a slider moved.
    pub fn clamp_years(&mut self) {
        if self.year_min > self.year_max {
            std::mem::swap(&mut self.year_min, &mut self.year_max);
        }
    }

    pub fn ask(&mut self) {
        let question = self.question.trim();
        self.answer = if question.is_empty() {
            None
        } else {
            Some(answer(&self.dataset, question))
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::filter;
    use crate::data::model::Record;

    fn state() -> AppState {
        let ds = Dataset::from_records(
            vec![
                Record::new("MinA", 2019)
                    .with_budget(10.0, 9.0)
                    .with_indicator("PIB", 1.0),
                Record::new("MinB", 2020).with_budget(20.0, 25.0),
                Record::new("MinA", 2021).with_budget(30.0, 20.0),
            ],
            vec!["PIB".into()],
        );
        AppState::new(ds, DashboardConfig::default())
    }

    #[test]
    fn defaults_cover_the_whole_dataset() {
        let s = state();
        assert_eq!((s.year_min, s.year_max), (2019, 2021));
        assert_eq!(s.data_ministry.as_deref(), Some("MinA"));
        assert_eq!(s.predictors, vec![Measure::Indicator("PIB".into())]);
        assert!(s.comparison_criteria().is_none());
    }

    #[test]
    fn viz_ignores_ministries_until_expense_chosen() {
        let mut s = state();
        s.toggle_institution("MinB");
        assert_eq!(filter(&s.dataset, &s.viz_criteria()).len(), 3);

        s.viz_expense = Some(ExpenseType::Executed);
        assert_eq!(filter(&s.dataset, &s.viz_criteria()).len(), 1);

        s.toggle_institution("MinB");
        assert_eq!(filter(&s.dataset, &s.viz_criteria()).len(), 3);
    }

    #[test]
    fn per_year_comparison_defaults_to_every_ministry() {
        let mut s = state();
        s.viz_year = 2020;
        assert_eq!(filter(&s.dataset, &s.viz_year_criteria()).len(), 1);
        s.toggle_institution("MinA");
        assert!(filter(&s.dataset, &s.viz_year_criteria()).is_empty());
    }

    #[test]
    fn comparison_choice_builds_criteria() {
        let mut s = state();
        s.comparison_year = 2021;
        s.comparison_choice = ComparisonChoice::AllInstitutions;
        assert_eq!(filter(&s.dataset, &s.comparison_criteria().unwrap()).len(), 1);

        s.comparison_choice = ComparisonChoice::Institution("MinB".into());
        assert!(filter(&s.dataset, &s.comparison_criteria().unwrap()).is_empty());
    }

    #[test]
    fn swapped_sliders_are_reordered() {
        let mut s = state();
        s.year_min = 2021;
        s.year_max = 2019;
        s.clamp_years();
        assert_eq!((s.year_min, s.year_max), (2019, 2021));
    }

    #[test]
    fn predictor_toggle_and_question() {
        let mut s = state();
        s.toggle_predictor(&Measure::Allocated);
        s.toggle_predictor(&Measure::Indicator("PIB".into()));
        assert_eq!(s.predictors, vec![Measure::Allocated]);

        s.question = "budget 2021".into();
        s.ask();
        assert!(matches!(s.answer, Some(QueryAnswer::Table { .. })));
        s.question = "   ".into();
        s.ask();
        assert!(s.answer.is_none());
    }
}
