use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::data::SamplePairs;
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Sweep plot (central panel)
// ---------------------------------------------------------------------------

/// Render the cropped trace as a single line.
pub fn sweep_plot(ui: &mut Ui, state: &ViewerState) {
    if state.pairs.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No samples inside the selected time window");
        });
        return;
    }

    let line = Line::new(PlotPoints::from(points(&state.pairs)))
        .name(format!("sweep {}", state.sweep))
        .color(Color32::LIGHT_BLUE)
        .width(1.5);

    Plot::new("sweep_plot")
        .x_axis_label(state.x_label.as_str())
        .y_axis_label(state.y_label.as_str())
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
        });
}

/// `values` against `times`.
pub fn points(pairs: &SamplePairs) -> Vec<[f64; 2]> {
    pairs
        .times
        .iter()
        .zip(pairs.values.iter())
        .map(|(&t, &v)| [t, v])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_pair_time_with_value() {
        let pairs = SamplePairs::new(vec![0.0, 0.5], vec![-70.0, -65.0]);
        assert_eq!(points(&pairs), vec![[0.0, -70.0], [0.5, -65.0]]);
    }
}
