use anyhow::{anyhow, Result};
use eframe::egui;

use crate::state::ViewerState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SweepViewerApp {
    pub state: ViewerState,
}

impl SweepViewerApp {
    pub fn new(state: ViewerState) -> Self {
        Self { state }
    }
}

impl eframe::App for SweepViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: recording / selection info ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::sweep_plot(ui, &self.state);
        });
    }
}

/// Open the plot window and block until the user closes it.
pub fn render_plot(state: ViewerState) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 640.0])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    let title = state.title.clone();
    log::info!("Opening plot window: {title}");
    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(SweepViewerApp::new(state)))),
    )
    .map_err(|e| anyhow!("plot window failed: {e}"))
}
