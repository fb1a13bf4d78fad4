use eframe::egui::{self, RichText, Ui};

use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top info bar: file, selection, window, and trace statistics.
pub fn top_bar(ui: &mut Ui, state: &ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.label(RichText::new(state.status_text()).monospace());
    });
}
