use std::io::Cursor;

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;

use crate::color::generate_rgb;
use crate::data::compare::Comparison;

use super::ExportError;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 600;

type DrawResult = Result<(), Box<dyn std::error::Error>>;

/// One vertical bar spanning `from..to` on the value axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub from: f64,
    pub to: f64,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Bar {
            label: label.into(),
            from: 0.0,
            to: value,
        }
    }
}

/// A named line of `(year, value)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(i32, f64)>,
}

// ---------------------------------------------------------------------------
// Public renderers
// ---------------------------------------------------------------------------

/// Allocated vs. executed side by side.
pub fn comparison_png(title: &str, y_desc: &str, cmp: &Comparison) -> Result<Vec<u8>, ExportError> {
    bars_png(
        title,
        y_desc,
        &[
            Bar::new("Budget Alloué", cmp.allocated),
            Bar::new("Budget Exécuté", cmp.executed),
        ],
    )
}

/// Allocated amount, the gap walking down (or up) from it, and the net
/// executed amount.
pub fn waterfall_png(title: &str, y_desc: &str, cmp: &Comparison) -> Result<Vec<u8>, ExportError> {
    bars_png(title, y_desc, &waterfall_bars(cmp))
}

pub fn waterfall_bars(cmp: &Comparison) -> Vec<Bar> {
    vec![
        Bar::new("Budget Alloué", cmp.allocated),
        Bar {
            label: "Écart (Budget non utilisé)".into(),
            from: cmp.allocated,
            to: cmp.allocated - cmp.gap.absolute,
        },
        Bar::new("Net", cmp.allocated - cmp.gap.absolute),
    ]
}

pub fn bars_png(title: &str, y_desc: &str, bars: &[Bar]) -> Result<Vec<u8>, ExportError> {
    if bars.is_empty() {
        return Err(ExportError::Empty("no bars to draw"));
    }
    let (lo, hi) = value_bounds(bars.iter().flat_map(|b| [b.from, b.to]));
    render(|root| {
        let colors = generate_rgb(bars.len());
        let n = bars.len() as i32;
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d((0..n).into_segmented(), lo..hi)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => bars
                    .get(*i as usize)
                    .map(|b| b.label.clone())
                    .unwrap_or_default(),
                SegmentValue::Last => String::new(),
            })
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
            let (r, g, b) = colors[i];
            let x0 = SegmentValue::Exact(i as i32);
            let x1 = SegmentValue::Exact(i as i32 + 1);
            let mut rect = Rectangle::new([(x0, bar.from), (x1, bar.to)], RGBColor(r, g, b).filled());
            rect.set_margin(0, 0, 12, 12);
            rect
        }))?;
        Ok(())
    })
}

/// Shares of a whole, e.g. allocated vs. executed or each ministry's part of
/// a year's spending. Non-positive slices are left out; nothing positive to
/// draw is an error.
pub fn pie_png(title: &str, slices: &[(String, f64)]) -> Result<Vec<u8>, ExportError> {
    let (labels, sizes): (Vec<String>, Vec<f64>) = slices
        .iter()
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
        .map(|(label, v)| (label.clone(), *v))
        .unzip();
    if sizes.is_empty() {
        return Err(ExportError::Empty("no positive share to draw"));
    }

    render(|root| {
        let area = root.titled(title, ("sans-serif", 24))?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.35;
        let colors: Vec<RGBColor> = generate_rgb(sizes.len())
            .into_iter()
            .map(|(r, g, b)| RGBColor(r, g, b))
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(-90.0);
        pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
        pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
        area.draw(&pie)?;
        Ok(())
    })
}

/// Allocated vs. executed as two slices.
pub fn comparison_pie_png(title: &str, cmp: &Comparison) -> Result<Vec<u8>, ExportError> {
    pie_png(
        title,
        &[
            ("Budget Alloué".to_string(), cmp.allocated),
            ("Budget Exécuté".to_string(), cmp.executed),
        ],
    )
}

/// One line per series across years, with a legend.
pub fn series_png(title: &str, y_desc: &str, series: &[Series]) -> Result<Vec<u8>, ExportError> {
    let years = series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
    let (Some(first), Some(last)) = (years.clone().min(), years.max()) else {
        return Err(ExportError::Empty("no points to draw"));
    };
    let (lo, hi) = value_bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    render(|root| {
        let colors = generate_rgb(series.len());
        let mut chart = ChartBuilder::on(root)
            .caption(title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(first..last + 1, lo..hi)?;

        chart
            .configure_mesh()
            .x_desc("Année")
            .y_desc(y_desc)
            .x_label_formatter(&|y| y.to_string())
            .draw()?;

        for (s, &(r, g, b)) in series.iter().zip(&colors) {
            let color = RGBColor(r, g, b);
            chart
                .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
                .label(s.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart.draw_series(
                s.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Value-axis range always containing zero, padded by 10%.
fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if max - min < f64::EPSILON {
        return (min, min + 1.0);
    }
    let pad = (max - min) * 0.1;
    (if min < 0.0 { min - pad } else { min }, max + pad)
}

/// Draw into an RGB buffer and encode it as PNG.
fn render<F>(draw: F) -> Result<Vec<u8>, ExportError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> DrawResult,
{
    let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| ExportError::Chart(e.to_string()))?;
        draw(&root).map_err(|e| ExportError::Chart(e.to_string()))?;
        root.present()
            .map_err(|e| ExportError::Chart(e.to_string()))?;
    }

    let img = RgbImage::from_raw(WIDTH, HEIGHT, buf)
        .ok_or_else(|| ExportError::Chart("pixel buffer size mismatch".into()))?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::compare::compare;

    #[test]
    fn waterfall_walks_from_allocated_to_executed() {
        let cmp = Comparison {
            allocated: 100.0,
            executed: 60.0,
            gap: compare(100.0, 60.0),
        };
        let bars = waterfall_bars(&cmp);
        assert_eq!(bars[1].from, 100.0);
        assert_eq!(bars[1].to, 60.0);
        assert_eq!(bars[2].to, 60.0);
    }

    #[test]
    fn bounds_include_zero_and_pad() {
        let (lo, hi) = value_bounds([10.0, 20.0].into_iter());
        assert_eq!(lo, 0.0);
        assert!((hi - 22.0).abs() < 1e-9);
        let (lo, hi) = value_bounds([-10.0, 10.0].into_iter());
        assert!(lo < -10.0 && hi > 10.0);
        assert_eq!(value_bounds([0.0, f64::NAN].into_iter()), (0.0, 1.0));
    }

    fn assert_png(bytes: &[u8]) {
        assert!(bytes.starts_with(b"\x89PNG"), "not a PNG: {:?}", &bytes[..bytes.len().min(8)]);
    }

    fn sample_comparison() -> Comparison {
        Comparison {
            allocated: 150.0,
            executed: 130.0,
            gap: compare(150.0, 130.0),
        }
    }

    #[test]
    fn comparison_and_waterfall_render() {
        let cmp = sample_comparison();
        assert_png(&comparison_png("MinA (2020)", "millions de CDF", &cmp).unwrap());
        assert_png(&waterfall_png("MinA (2020)", "millions de CDF", &cmp).unwrap());
    }

    #[test]
    fn overspend_waterfall_renders() {
        let cmp = Comparison {
            allocated: 100.0,
            executed: 130.0,
            gap: compare(100.0, 130.0),
        };
        assert_eq!(waterfall_bars(&cmp)[1].to, 130.0);
        assert_png(&waterfall_png("Dépassement", "millions de CDF", &cmp).unwrap());
    }

    #[test]
    fn bars_and_series_render() {
        let bars = [Bar::new("MinA", 100.0), Bar::new("MinB", 50.0)];
        assert_png(&bars_png("2020", "millions de CDF", &bars).unwrap());

        let series = [
            Series {
                name: "MinA".into(),
                points: vec![(2019, 10.0), (2020, 12.0), (2021, 9.0)],
            },
            Series {
                name: "MinB".into(),
                points: vec![(2020, 4.0)],
            },
        ];
        assert_png(&series_png("Évolution", "millions de CDF", &series).unwrap());
    }

    #[test]
    fn pies_render_and_skip_empty_slices() {
        assert_png(&comparison_pie_png("MinA (2020)", &sample_comparison()).unwrap());

        let shares = vec![
            ("MinA".to_string(), 100.0),
            ("MinB".to_string(), 0.0),
            ("MinC".to_string(), 25.0),
        ];
        assert_png(&pie_png("Parts 2020", &shares).unwrap());
    }

    #[test]
    fn pie_with_both_totals_zero_is_rejected() {
        let cmp = Comparison {
            allocated: 0.0,
            executed: 0.0,
            gap: compare(0.0, 0.0),
        };
        assert!(matches!(comparison_pie_png("Vide", &cmp), Err(ExportError::Empty(_))));
    }

    #[test]
    fn empty_inputs_are_rejected_before_drawing() {
        assert!(matches!(bars_png("t", "y", &[]), Err(ExportError::Empty(_))));
        let empty = [Series {
            name: "MinA".into(),
            points: vec![],
        }];
        assert!(matches!(series_png("t", "y", &empty), Err(ExportError::Empty(_))));
    }
}
