use anyhow::{anyhow, Result};
use eframe::egui;

use crate::data::model::CurveSet;
use crate::state::ViewerState;
use crate::ui::{panels, plot};

pub struct TraceViewerApp {
    pub state: ViewerState,
}

impl TraceViewerApp {
    pub fn new(curves: CurveSet) -> Self {
        Self {
            state: ViewerState::new(curves),
        }
    }
}

impl eframe::App for TraceViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            plot::trace_plot(ui, &self.state);
        });
    }
}

/// Open a window plotting `curves` and block until it is closed.
pub fn show(title: &str, curves: CurveSet) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        title,
        options,
        Box::new(|_cc| Ok(Box::new(TraceViewerApp::new(curves)))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
