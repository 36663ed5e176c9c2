use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use crate::color::ColorMap;
use crate::data::regression::LinearFit;

const PLOT_HEIGHT: f32 = 320.0;

/// Year ticks without decimals.
fn year_axis(plot: Plot<'_>) -> Plot<'_> {
    plot.x_axis_formatter(|mark, _range| format!("{:.0}", mark.value))
}

// ---------------------------------------------------------------------------
// Expense charts (visualisation page)
// ---------------------------------------------------------------------------

/// Grouped bars: one bar per institution within each year.
pub fn grouped_bars(
    ui: &mut Ui,
    id: &str,
    y_label: &str,
    series: &[(String, Vec<(i32, f64)>)],
    colors: &ColorMap,
) {
    let n = series.len().max(1) as f64;
    let width = 0.8 / n;

    year_axis(Plot::new(id))
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Année")
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for (i, (name, points)) in series.iter().enumerate() {
                let offset = -0.4 + width * (i as f64 + 0.5);
                let color = colors.color_for(name);
                let bars = points
                    .iter()
                    .map(|&(year, v)| {
                        Bar::new(year as f64 + offset, v)
                            .width(width * 0.95)
                            .fill(color)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(name).color(color));
            }
        });
}

/// One line with markers per series across years.
pub fn lines(
    ui: &mut Ui,
    id: &str,
    y_label: &str,
    series: &[(String, Vec<(i32, f64)>)],
    colors: &ColorMap,
) {
    year_axis(Plot::new(id))
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label("Année")
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            for (name, points) in series {
                let color = colors.color_for(name);
                let pts: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x as f64, y]).collect();
                plot_ui.line(
                    Line::new(PlotPoints::from(pts.clone()))
                        .name(name)
                        .color(color)
                        .width(2.0),
                );
                plot_ui.points(Points::new(pts).radius(3.5).color(color));
            }
        });
}

/// Horizontal bars comparing named values (ministries for one year).
pub fn horizontal_bars(ui: &mut Ui, id: &str, x_label: &str, values: &[(String, f64)], colors: &ColorMap) {
    Plot::new(id)
        .legend(Legend::default())
        .height(PLOT_HEIGHT.min(60.0 + 40.0 * values.len() as f32).max(160.0))
        .x_axis_label(x_label)
        .show_y(false)
        .show(ui, |plot_ui| {
            for (i, (name, v)) in values.iter().enumerate() {
                let color = colors.color_for(name);
                let bar = Bar::new(i as f64, *v).width(0.7).fill(color).name(name);
                plot_ui.bar_chart(BarChart::new(vec![bar]).horizontal().name(name).color(color));
            }
        });
}

/// Allocated vs. executed, two bars.
pub fn comparison_bars(ui: &mut Ui, id: &str, allocated: f64, executed: f64) {
    let steel_blue = Color32::from_rgb(0x46, 0x82, 0xB4);
    let lime_green = Color32::from_rgb(0x32, 0xCD, 0x32);
    Plot::new(id)
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .show_x(false)
        .allow_drag(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(
                BarChart::new(vec![Bar::new(0.0, allocated).width(0.6).fill(steel_blue)])
                    .name("Budget Alloué")
                    .color(steel_blue),
            );
            plot_ui.bar_chart(
                BarChart::new(vec![Bar::new(1.0, executed).width(0.6).fill(lime_green)])
                    .name("Budget Exécuté")
                    .color(lime_green),
            );
        });
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

/// Observations as points plus the fitted line across their x range.
pub fn scatter_with_fit(
    ui: &mut Ui,
    id: &str,
    (x_label, y_label): (&str, &str),
    x: &[f64],
    y: &[f64],
    fit: &LinearFit,
) {
    let pts: Vec<[f64; 2]> = x.iter().zip(y).map(|(&a, &b)| [a, b]).collect();
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Plot::new(id)
        .legend(Legend::default())
        .height(PLOT_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(pts)
                    .radius(4.0)
                    .color(Color32::LIGHT_BLUE)
                    .name("Observations"),
            );
            if lo.is_finite() && hi.is_finite() {
                plot_ui.line(
                    Line::new(vec![[lo, fit.predict(lo)], [hi, fit.predict(hi)]])
                        .color(Color32::RED)
                        .width(2.0)
                        .name(format!("y = {:.3} + {:.3}x", fit.intercept, fit.slope)),
                );
            }
        });
}
