use eframe::egui::{self, Color32, RichText, Ui};

use crate::export::{self, ExportError};
use crate::state::{AppState, Page};

/// Sky blue used for amounts.
pub const SKY_BLUE: Color32 = Color32::from_rgb(0x00, 0xBF, 0xFF);

// ---------------------------------------------------------------------------
// Left side panel – navigation and shared filters
// ---------------------------------------------------------------------------

/// Render the left panel: page menu, then the year range shared by pages.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Menu");
    ui.separator();

    for page in Page::ALL {
        if ui
            .selectable_label(state.page == page, page.title())
            .clicked()
        {
            state.page = page;
        }
    }
    ui.separator();

    let Some((lo, hi)) = state.dataset.year_range() else {
        ui.label("Le jeu de données est vide.");
        return;
    };

    ui.strong("Plage de dates");
    ui.add(egui::Slider::new(&mut state.year_min, lo..=hi).text("de"));
    ui.add(egui::Slider::new(&mut state.year_max, lo..=hi).text("à"));
    state.clamp_years();

    ui.add_space(8.0);
    ui.label(
        RichText::new(format!(
            "{} lignes, {} institutions, {} indicateurs",
            state.dataset.len(),
            state.dataset.institutions.len(),
            state.dataset.indicator_columns.len()
        ))
        .small(),
    );
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Système d'aide à la décision pour la gestion des dépenses publiques");
        ui.separator();
        ui.label(state.page.title());
        ui.separator();
        ui.label(state.config.dataset_path.display().to_string());

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
            if ui.small_button("✕").clicked() {
                state.status_message = None;
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// A button that builds an export and writes it where the user chooses.
/// Failures land in `status`; nothing here aborts the session.
pub fn export_button<F>(
    ui: &mut Ui,
    status: &mut Option<String>,
    label: &str,
    file_name: &str,
    build: F,
) where
    F: FnOnce() -> Result<Vec<u8>, ExportError>,
{
    if !ui.button(label).clicked() {
        return;
    }
    let ext = file_name.rsplit('.').next().unwrap_or_default();
    let Some(path) = rfd::FileDialog::new()
        .set_title(label)
        .set_file_name(file_name)
        .add_filter(ext.to_uppercase(), &[ext])
        .save_file()
    else {
        return;
    };

    match build().and_then(|bytes| export::save(&path, &bytes)) {
        Ok(()) => *status = None,
        Err(e) => {
            log::error!("Export {file_name} failed: {e}");
            *status = Some(format!("Échec de l'export {file_name} : {e}"));
        }
    }
}

/// Informational line for "nothing matches the selection".
pub fn no_data(ui: &mut Ui, text: impl Into<String>) {
    ui.label(RichText::new(text.into()).italics().color(Color32::GRAY));
}

/// Yellow warning line, e.g. a fit that was not attempted.
pub fn warning(ui: &mut Ui, text: impl Into<String>) {
    ui.label(RichText::new(format!("⚠ {}", text.into())).color(Color32::from_rgb(0xE0, 0xA0, 0x00)));
}
