use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use supersale_insights::Dimension;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Select filter here:");
    ui.separator();

    // The Arc clone lets us mutate state inside the loops.
    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some(filters) = state.filters.clone() else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Per-dimension multi-selects (collapsible) ----
            for dim in Dimension::ALL {
                let options = dim.options(&dataset);
                let selected = filters.selected(dim);
                let header_text = format!(
                    "Select the {}:  ({}/{})",
                    dim.label(),
                    selected.len(),
                    options.len()
                );

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.label())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(dim);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(dim);
                            }
                        });

                        for value in options {
                            let mut checked = selected.contains(value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                state.toggle_filter_value(dim, value);
                            }
                        }
                    });
            }

            ui.separator();

            // ---- Hour range ----
            ui.strong("Select time range (in hours):");
            let (min_h, max_h) = dataset.hour_bounds.unwrap_or((0, 23));
            let mut lo = filters.hours.lo().clamp(min_h, max_h);
            let mut hi = filters.hours.hi().clamp(min_h, max_h);
            let lo_changed = ui
                .add(egui::Slider::new(&mut lo, min_h..=max_h).text("From"))
                .changed();
            let hi_changed = ui
                .add(egui::Slider::new(&mut hi, min_h..=max_h).text("To"))
                .changed();
            if lo_changed || hi_changed {
                // Drag one handle past the other and both move together.
                if lo > hi {
                    if lo_changed {
                        hi = lo;
                    } else {
                        lo = hi;
                    }
                }
                state.set_hours(lo, hi);
            }
            ui.label(format!("Hours between: ({lo}, {hi})"));
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong("📈 SuperSale Insights: Analyzing Supermarket Sales");
        ui.separator();

        if let (Some(ds), Some(report)) = (&state.dataset, &state.report) {
            ui.label(format!(
                "{} of {} transactions selected",
                report.matched_rows,
                ds.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter(
            "Supported files",
            &["xlsx", "xlsm", "xls", "ods", "csv", "json", "parquet", "pq"],
        )
        .add_filter("Spreadsheet", &["xlsx", "xlsm", "xls", "ods"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open(path);
    }
}
