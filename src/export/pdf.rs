use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::data::compare::Comparison;
use crate::data::regression::{LinearFit, MultiFit};
use crate::data::table::Table;

use super::ExportError;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const LINE: f32 = 6.5;
/// Widest table that still fits on an A4 page in portrait.
const MAX_TABLE_COLUMNS: usize = 8;

/// A narrative report: title, free text lines, optional table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub title: String,
    pub lines: Vec<String>,
    pub table: Option<Table>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Report {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(text.into());
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }
}

/// Report for the allocated vs. executed comparison of one selection.
pub fn comparison_report(scope: &str, year: i32, cmp: &Comparison, currency: &str) -> Report {
    let direction = if cmp.gap.absolute >= 0.0 {
        "sous-exécution (budget non entièrement dépensé)"
    } else {
        "dépassement budgétaire"
    };
    Report::new(format!("Comparaison Budget et Exécution : {scope} ({year})"))
        .line(format!("Budget alloué : {:.2} {currency}", cmp.allocated))
        .line(format!("Budget exécuté : {:.2} {currency}", cmp.executed))
        .line(format!("Écart absolu : {:.2} {currency}", cmp.gap.absolute))
        .line(format!("Écart en pourcentage : {:.2}%", cmp.gap.percentage))
        .line(format!("Interprétation : {direction}"))
}

/// Report for a single-predictor regression.
pub fn linear_report(predictor: &str, response: &str, fit: &LinearFit) -> Report {
    Report::new(format!("Régression linéaire : {response} ~ {predictor}"))
        .line(format!("Observations : {}", fit.n))
        .line(format!(
            "Équation : {response} = {:.4} + {:.4} × {predictor}",
            fit.intercept, fit.slope
        ))
        .line(format!("Coefficient de détermination R² : {:.4}", fit.r_squared))
        .line(format!(
            "Une hausse d'une unité de {predictor} est associée à une variation de {:.4} de {response}.",
            fit.slope
        ))
}

/// Report for a multivariate regression.
pub fn multivariate_report(predictors: &[String], response: &str, fit: &MultiFit) -> Report {
    let mut report = Report::new(format!("Régression multivariée : {response}"))
        .line(format!("Observations : {}", fit.n))
        .line(format!("Constante : {:.4}", fit.intercept));
    for (name, coef) in predictors.iter().zip(&fit.coefficients) {
        report = report.line(format!("Coefficient {name} : {coef:.4}"));
    }
    report.line(format!("Coefficient de détermination R² : {:.4}", fit.r_squared))
}

/// Lay out the report on A4 pages with a built-in font.
pub fn write_pdf(report: &Report) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(&report.title, Mm(PAGE_W), Mm(PAGE_H), "Calque 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;

    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_H - MARGIN,
    };

    let new_page = |cursor: &mut Cursor| {
        let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Calque 1");
        cursor.layer = doc.get_page(page).get_layer(layer);
        cursor.y = PAGE_H - MARGIN;
    };

    cursor.write(&report.title, 16.0, MARGIN, &bold);
    cursor.y -= LINE;

    for text in &report.lines {
        if cursor.y < MARGIN {
            new_page(&mut cursor);
        }
        cursor.write(text, 11.0, MARGIN, &regular);
    }

    if let Some(table) = &report.table {
        let shown = table.columns.len().min(MAX_TABLE_COLUMNS);
        let col_w = (PAGE_W - 2.0 * MARGIN) / shown.max(1) as f32;
        cursor.y -= LINE;

        let header: Vec<&str> = table.columns.iter().take(shown).map(String::as_str).collect();
        cursor.write_row(&header, col_w, &bold);
        for row in &table.rows {
            if cursor.y < MARGIN {
                new_page(&mut cursor);
                cursor.write_row(&header, col_w, &bold);
            }
            let cells: Vec<String> = row.iter().take(shown).map(|v| v.to_string()).collect();
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            cursor.write_row(&cells, col_w, &regular);
        }
        if table.columns.len() > shown {
            cursor.write(
                &format!("({} colonnes omises)", table.columns.len() - shown),
                9.0,
                MARGIN,
                &regular,
            );
        }
    }

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Current layer and vertical position on it.
struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn write(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
        self.y -= LINE;
    }

    fn write_row(&mut self, cells: &[&str], col_w: f32, font: &IndirectFontRef) {
        for (i, cell) in cells.iter().enumerate() {
            let x = MARGIN + i as f32 * col_w;
            self.layer
                .use_text(truncate(cell, col_w), 9.0, Mm(x), Mm(self.y), font);
        }
        self.y -= LINE;
    }
}

/// Cut text that would overflow a column (about 2 mm per character at 9 pt).
fn truncate(text: &str, col_w: f32) -> String {
    let max_chars = ((col_w / 2.0) as usize).max(3);
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 1).collect();
    out.push('…');
    out
}
