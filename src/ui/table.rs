use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Value;
use crate::data::table::Table;

const ROW_HEIGHT: f32 = 18.0;

/// Render a [`Table`] with a sticky header. `id` keeps several tables on one
/// page apart.
pub fn table_view(ui: &mut Ui, id: &str, table: &Table, max_height: f32) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(max_height)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(60.0), table.columns.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for name in &table.columns {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.rows.len(), |mut row| {
                    let cells = &table.rows[row.index()];
                    for cell in cells {
                        row.col(|ui| {
                            match cell {
                                Value::Float(v) => ui.monospace(format!("{v:.2}")),
                                Value::Integer(i) => ui.monospace(i.to_string()),
                                other => ui.label(other.to_string()),
                            };
                        });
                    }
                });
            });
    });
}
