use eframe::egui::Ui;
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::state::ViewerState;

/// Render the visible curves in the central panel, one labeled line each.
pub fn trace_plot(ui: &mut Ui, state: &ViewerState) {
    let set = &state.curves;

    Plot::new("trace_plot")
        .legend(Legend::default())
        .x_axis_label(format!("[{}]", set.unit_x))
        .y_axis_label(format!("[{}]", set.unit_y))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &idx in &state.visible_indices {
                let curve = &set.curves[idx];

                // axis and samples may differ in length; plot the overlap
                let points: PlotPoints = curve
                    .x
                    .iter()
                    .zip(curve.y.iter())
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                let line = Line::new(points)
                    .name(&curve.name)
                    .color(state.curve_color(idx))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}
