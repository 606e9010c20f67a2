use eframe::egui::{self, RichText, ScrollArea, Ui};

use crate::state::ViewerState;

/// Left panel: colour selector and per-field filters.
pub fn side_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading("Traces");
    ui.separator();

    if state.curves.column_names.is_empty() {
        ui.label("Trace names carry no key fields.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let fields = state.curves.column_names.clone();
    let unique = state.curves.unique_values.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Color by");
            let current = state.color_field.clone();
            egui::ComboBox::from_id_salt("color_by")
                .selected_text(current.as_deref().unwrap_or("curve"))
                .show_ui(ui, |ui: &mut Ui| {
                    if ui.selectable_label(current.is_none(), "curve").clicked() {
                        state.set_color_field(None);
                    }
                    for field in &fields {
                        if ui
                            .selectable_label(current.as_deref() == Some(field.as_str()), field)
                            .clicked()
                        {
                            state.set_color_field(Some(field.clone()));
                        }
                    }
                });
            ui.separator();

            for field in &fields {
                let Some(all_values) = unique.get(field) else {
                    continue;
                };
                let n_selected = state.filters.get(field).map_or(0, |s| s.len());
                let header_text = format!("{field}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(field)
                    .default_open(field == "trace")
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(field);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(field);
                            }
                        });

                        for val in all_values {
                            let mut checked = state
                                .filters
                                .get(field)
                                .is_some_and(|s| s.contains(val));
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                state.toggle_filter_value(field, val);
                            }
                        }
                    });
            }
        });
}

/// Top bar: batch summary.
pub fn top_bar(ui: &mut Ui, state: &ViewerState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!(
            "{} traces loaded, {} visible",
            state.curves.len(),
            state.visible_indices.len()
        ));
    });
}
