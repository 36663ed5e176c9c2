use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::aggregate::{aggregate, indicator_table, mean_by_year, series_by_institution, GroupBy};
use crate::data::compare::compare_totals;
use crate::data::filter::filter;
use crate::data::model::{ExpenseType, Measure, Value, INSTITUTION_COLUMN};
use crate::data::query::QueryAnswer;
use crate::data::regression::{fit_linear, fit_multivariate, observations, pairs};
use crate::data::table::Table;
use crate::export::{chart, csv, pdf, xlsx};
use crate::state::{AnalysisTab, AppState, ComparisonChoice};
use crate::ui::panels::{export_button, no_data, warning, SKY_BLUE};
use crate::ui::plot;
use crate::ui::table::table_view;

const TABLE_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

pub fn data_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Données budgétaires");

    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_label("Type de dépense")
            .selected_text(state.data_expense.column_name())
            .show_ui(ui, |ui| {
                for e in ExpenseType::ALL {
                    ui.selectable_value(&mut state.data_expense, e, e.column_name());
                }
            });

        let ministries = state.dataset.institutions_with(state.data_expense);
        if state
            .data_ministry
            .as_ref()
            .is_some_and(|m| !ministries.contains(m))
        {
            state.data_ministry = ministries.first().cloned();
        }
        egui::ComboBox::from_label("Ministère")
            .selected_text(state.data_ministry.as_deref().unwrap_or("Tous"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.data_ministry, None, "Tous");
                for m in ministries {
                    let label = m.clone();
                    ui.selectable_value(&mut state.data_ministry, Some(m), label);
                }
            });

        egui::ComboBox::from_label("Indicateur")
            .selected_text(state.data_indicator.as_deref().unwrap_or("Aucun"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.data_indicator, None, "Aucun");
                for ind in &state.dataset.indicator_columns {
                    ui.selectable_value(&mut state.data_indicator, Some(ind.clone()), ind.as_str());
                }
            });
    });
    ui.separator();

    let dataset = Arc::clone(&state.dataset);
    let criteria = state.data_criteria();
    let subset = filter(&dataset, &criteria);
    if subset.is_empty() {
        no_data(ui, "Aucune ligne ne correspond à la sélection.");
        return;
    }

    if let Some(indicator) = state.data_indicator.clone() {
        let label = state
            .data_ministry
            .clone()
            .unwrap_or_else(|| state.data_expense.column_name().to_string());
        let table = indicator_table(&subset, &indicator, state.data_expense, &label);

        ui.strong(format!("{indicator} et {label} par année"));
        table_view(ui, "indicator_table", &table, 120.0);
        ui.horizontal(|ui: &mut Ui| {
            export_button(ui, &mut state.status_message, "Exporter CSV", "indicateur.csv", || {
                csv::write_csv(&table)
            });
            export_button(ui, &mut state.status_message, "Exporter Excel", "indicateur.xlsx", || {
                xlsx::write_xlsx(&table, "Indicateur")
            });
        });
        ui.separator();
    }

    let rows = subset.to_table(Some(&criteria.measures()));
    ui.strong(format!("{} lignes filtrées", rows.len()));
    table_view(ui, "filtered_rows", &rows, TABLE_HEIGHT);
    ui.horizontal(|ui: &mut Ui| {
        export_button(ui, &mut state.status_message, "Exporter CSV", "donnees_filtrees.csv", || {
            csv::write_csv(&rows)
        });
        export_button(ui, &mut state.status_message, "Exporter Excel", "donnees_filtrees.xlsx", || {
            xlsx::write_xlsx(&rows, "Données")
        });
    });
}

// ---------------------------------------------------------------------------
// Visualisation
// ---------------------------------------------------------------------------

pub fn visualisation_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Visualisation");

    ui.horizontal(|ui: &mut Ui| {
        let current = state.viz_expense.map(ExpenseType::column_name).unwrap_or("Aucun");
        egui::ComboBox::from_label("Type de dépense")
            .selected_text(current)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.viz_expense, None, "Aucun");
                for e in ExpenseType::ALL {
                    ui.selectable_value(&mut state.viz_expense, Some(e), e.column_name());
                }
            });

        egui::ComboBox::from_label("Indicateur")
            .selected_text(state.viz_indicator.as_deref().unwrap_or("Aucun"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.viz_indicator, None, "Aucun");
                for ind in &state.dataset.indicator_columns {
                    ui.selectable_value(&mut state.viz_indicator, Some(ind.clone()), ind.as_str());
                }
            });
    });

    let Some(expense) = state.viz_expense else {
        warning(ui, "Choisissez un type de dépense pour sélectionner des ministères.");
        ui.separator();
        indicator_section(ui, state);
        return;
    };

    ui.collapsing("Ministères (aucun coché = tous)", |ui| {
        for name in state.dataset.institutions_with(expense) {
            let mut checked = state.viz_institutions.contains(&name);
            if ui.checkbox(&mut checked, name.as_str()).changed() {
                state.toggle_institution(&name);
            }
        }
        if ui.small_button("Tout décocher").clicked() {
            state.viz_institutions.clear();
        }
    });
    ui.separator();

    let dataset = Arc::clone(&state.dataset);
    let subset = filter(&dataset, &state.viz_criteria());
    let measure = expense.measure();
    if subset.is_empty() {
        no_data(ui, "Aucune donnée pour cette sélection.");
    } else {
        let series = series_by_institution(subset.records(), &measure);

        ui.strong(format!("{} par année", measure.name()));
        plot::grouped_bars(ui, "viz_bars", &state.config.currency_label, &series, &state.colors);

        ui.strong(format!("Évolution de {}", measure.name()));
        plot::lines(ui, "viz_lines", &state.config.currency_label, &series, &state.colors);

        let png_series: Vec<chart::Series> = series
            .iter()
            .map(|(name, points)| chart::Series {
                name: name.clone(),
                points: points.clone(),
            })
            .collect();
        let title = format!("Évolution de {}", measure.name());
        let currency = state.config.currency_label.clone();
        export_button(ui, &mut state.status_message, "Exporter PNG", "evolution.png", || {
            chart::series_png(&title, &currency, &png_series)
        });
    }
    ui.separator();

    year_comparison_section(ui, state, expense);
    ui.separator();
    indicator_section(ui, state);
}

/// Ministries side by side for one year, with their share of the total.
fn year_comparison_section(ui: &mut Ui, state: &mut AppState, expense: ExpenseType) {
    let Some((lo, hi)) = state.dataset.year_range() else {
        return;
    };
    ui.strong("Comparaison entre ministères");
    ui.add(egui::Slider::new(&mut state.viz_year, lo..=hi).text("Année"));

    let dataset = Arc::clone(&state.dataset);
    let subset = filter(&dataset, &state.viz_year_criteria());
    let measure = expense.measure();
    let view = aggregate(subset.records(), GroupBy::Institution, std::slice::from_ref(&measure));
    if view.is_empty() {
        no_data(ui, format!("Aucune donnée pour {}.", state.viz_year));
        return;
    }

    let values: Vec<(String, f64)> = view
        .series(&measure)
        .into_iter()
        .map(|(key, v)| (key.to_string(), v))
        .collect();
    plot::horizontal_bars(ui, "viz_year_bars", &state.config.currency_label, &values, &state.colors);

    let total = view.total(&measure);
    let mut shares = Table::new(vec![
        INSTITUTION_COLUMN.to_string(),
        measure.name().to_string(),
        "Part (%)".to_string(),
    ]);
    for (name, v) in &values {
        let share = if total != 0.0 { v / total * 100.0 } else { 0.0 };
        shares.push_row(vec![Value::Text(name.clone()), Value::Float(*v), Value::Float(share)]);
    }
    table_view(ui, "viz_year_shares", &shares, 160.0);

    let bars: Vec<chart::Bar> = values.iter().map(|(n, v)| chart::Bar::new(n.clone(), *v)).collect();
    let title = format!("{} en {}", measure.name(), state.viz_year);
    let currency = state.config.currency_label.clone();
    ui.horizontal(|ui: &mut Ui| {
        export_button(ui, &mut state.status_message, "Exporter PNG", "comparaison_ministeres.png", || {
            chart::bars_png(&title, &currency, &bars)
        });
        export_button(ui, &mut state.status_message, "Camembert PNG", "parts_ministeres.png", || {
            chart::pie_png(&title, &values)
        });
        export_button(ui, &mut state.status_message, "Exporter CSV", "parts_ministeres.csv", || {
            csv::write_csv(&shares)
        });
    });
}

/// Yearly mean of the selected indicator over the current selection.
fn indicator_section(ui: &mut Ui, state: &mut AppState) {
    let Some(indicator) = state.viz_indicator.clone() else {
        return;
    };
    let dataset = Arc::clone(&state.dataset);
    let subset = filter(&dataset, &state.viz_criteria());
    let points = mean_by_year(subset.records(), &Measure::Indicator(indicator.clone()));
    if points.is_empty() {
        no_data(ui, format!("Aucune valeur de {indicator} sur la période."));
        return;
    }

    ui.strong(format!("Évolution de {indicator}"));
    let series = vec![(indicator.clone(), points)];
    plot::lines(ui, "viz_indicator", &indicator, &series, &state.colors);

    let png = vec![chart::Series {
        name: indicator.clone(),
        points: series[0].1.clone(),
    }];
    let title = format!("Évolution de {indicator}");
    export_button(ui, &mut state.status_message, "Exporter PNG", "indicateur.png", || {
        chart::series_png(&title, &indicator, &png)
    });
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

pub fn analysis_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Analyse");
    ui.horizontal(|ui: &mut Ui| {
        ui.selectable_value(&mut state.analysis_tab, AnalysisTab::Comparison, "Budget vs Exécution");
        ui.selectable_value(&mut state.analysis_tab, AnalysisTab::Regression, "Régression");
    });
    ui.separator();

    match state.analysis_tab {
        AnalysisTab::Comparison => comparison_tab(ui, state),
        AnalysisTab::Regression => regression_tab(ui, state),
    }
}

fn comparison_tab(ui: &mut Ui, state: &mut AppState) {
    let Some((lo, hi)) = state.dataset.year_range() else {
        no_data(ui, "Le jeu de données est vide.");
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_label("Sélection")
            .selected_text(state.comparison_choice.label().to_string())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut state.comparison_choice, ComparisonChoice::Nothing, "Aucun ministère");
                ui.selectable_value(
                    &mut state.comparison_choice,
                    ComparisonChoice::AllInstitutions,
                    "Budget et Exécution",
                );
                for name in &state.dataset.institutions {
                    ui.selectable_value(
                        &mut state.comparison_choice,
                        ComparisonChoice::Institution(name.clone()),
                        name.as_str(),
                    );
                }
            });
        ui.add(egui::Slider::new(&mut state.comparison_year, lo..=hi).text("Année"));
    });

    let Some(criteria) = state.comparison_criteria() else {
        no_data(ui, "Sélectionnez un ministère ou l'ensemble des institutions.");
        return;
    };
    let dataset = Arc::clone(&state.dataset);
    let subset = filter(&dataset, &criteria);
    let cmp = compare_totals(&subset);
    if cmp.is_empty() {
        warning(ui, "Aucune donnée valide pour cette sélection et cette année.");
        return;
    }

    let currency = state.config.currency_label.clone();
    let gap_color = if cmp.gap.absolute < 0.0 { Color32::RED } else { SKY_BLUE };
    egui::Grid::new("comparison_grid").num_columns(2).show(ui, |ui| {
        ui.label("Budget alloué");
        ui.label(RichText::new(format!("{:.2} {currency}", cmp.allocated)).color(SKY_BLUE).strong());
        ui.end_row();
        ui.label("Budget exécuté");
        ui.label(RichText::new(format!("{:.2} {currency}", cmp.executed)).color(SKY_BLUE).strong());
        ui.end_row();
        ui.label("Écart");
        ui.label(RichText::new(format!("{:.2} {currency}", cmp.gap.absolute)).color(gap_color).strong());
        ui.end_row();
        ui.label("Écart (%)");
        ui.label(RichText::new(format!("{:.2} %", cmp.gap.percentage)).color(gap_color).strong());
        ui.end_row();
    });

    plot::comparison_bars(ui, "comparison_bars", cmp.allocated, cmp.executed);

    let scope = state.comparison_choice.label().to_string();
    let year = state.comparison_year;
    let title = format!("{scope} ({year})");
    ui.horizontal(|ui: &mut Ui| {
        export_button(ui, &mut state.status_message, "Graphique PNG", "comparaison.png", || {
            chart::comparison_png(&title, &currency, &cmp)
        });
        export_button(ui, &mut state.status_message, "Cascade PNG", "cascade.png", || {
            chart::waterfall_png(&title, &currency, &cmp)
        });
        export_button(ui, &mut state.status_message, "Camembert PNG", "repartition.png", || {
            chart::comparison_pie_png(&title, &cmp)
        });
        export_button(ui, &mut state.status_message, "Rapport PDF", "rapport_comparaison.pdf", || {
            pdf::write_pdf(&pdf::comparison_report(&scope, year, &cmp, &currency))
        });
    });
}

fn regression_tab(ui: &mut Ui, state: &mut AppState) {
    let measures = state.dataset.measures();

    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_label("Variable expliquée")
            .selected_text(state.response.name().to_string())
            .show_ui(ui, |ui| {
                for m in &measures {
                    ui.selectable_value(&mut state.response, m.clone(), m.name());
                }
            });
    });
    ui.collapsing("Variables explicatives", |ui| {
        for m in &measures {
            if *m == state.response {
                continue;
            }
            let mut checked = state.predictors.contains(m);
            if ui.checkbox(&mut checked, m.name()).changed() {
                state.toggle_predictor(m);
            }
        }
    });
    ui.separator();

    let predictors: Vec<Measure> = state
        .predictors
        .iter()
        .filter(|m| **m != state.response)
        .cloned()
        .collect();
    if predictors.is_empty() {
        warning(ui, "Choisissez au moins une variable explicative.");
        return;
    }

    let dataset = Arc::clone(&state.dataset);
    let subset = filter(&dataset, &state.regression_criteria());
    let response = state.response.clone();

    if let [predictor] = predictors.as_slice() {
        let (x, y) = pairs(&subset, predictor, &response);
        let fit = match fit_linear(&x, &y) {
            Ok(fit) => fit,
            Err(e) => {
                warning(ui, format!("Régression non calculée : {e}"));
                return;
            }
        };
        ui.label(format!(
            "{} = {:.4} + {:.4} × {}",
            response.name(),
            fit.intercept,
            fit.slope,
            predictor.name()
        ));
        ui.label(format!("R² = {:.4} ({} observations)", fit.r_squared, fit.n));
        plot::scatter_with_fit(ui, "regression_scatter", (predictor.name(), response.name()), &x, &y, &fit);

        export_button(ui, &mut state.status_message, "Rapport PDF", "regression.pdf", || {
            pdf::write_pdf(&pdf::linear_report(predictor.name(), response.name(), &fit))
        });
    } else {
        let (rows, y) = observations(&subset, &predictors, &response);
        let fit = match fit_multivariate(&rows, &y) {
            Ok(fit) => fit,
            Err(e) => {
                warning(ui, format!("Régression non calculée : {e}"));
                return;
            }
        };
        let names: Vec<String> = predictors.iter().map(|m| m.name().to_string()).collect();

        let mut coefficients = Table::new(vec!["Variable".to_string(), "Coefficient".to_string()]);
        coefficients.push_row(vec![Value::Text("Constante".into()), Value::Float(fit.intercept)]);
        for (name, coef) in names.iter().zip(&fit.coefficients) {
            coefficients.push_row(vec![Value::Text(name.clone()), Value::Float(*coef)]);
        }
        table_view(ui, "regression_coefficients", &coefficients, 200.0);
        ui.label(format!("R² = {:.4} ({} observations)", fit.r_squared, fit.n));

        export_button(ui, &mut state.status_message, "Rapport PDF", "regression.pdf", || {
            pdf::write_pdf(&pdf::multivariate_report(&names, response.name(), &fit).table(coefficients.clone()))
        });
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

pub fn query_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Posez une question");
    ui.label("Exemple : « budget du Ministère de la Santé en 2021 »");

    ui.horizontal(|ui: &mut Ui| {
        let edit = ui.add(egui::TextEdit::singleline(&mut state.question).desired_width(420.0));
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Demander").clicked() || submitted {
            state.ask();
        }
    });
    ui.separator();

    match &state.answer {
        None => {}
        Some(QueryAnswer::NotFound(msg)) => no_data(ui, msg.as_str()),
        Some(QueryAnswer::Table { measure, table }) => {
            ui.strong(measure.name());
            table_view(ui, "query_answer", table, TABLE_HEIGHT);
            export_button(ui, &mut state.status_message, "Exporter CSV", "reponse.csv", || {
                csv::write_csv(table)
            });
        }
    }
}
