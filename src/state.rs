use crate::data::model::SampleStats;
use crate::data::{Recording, SamplePairs, TimeWindow};

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Everything the plot window shows, independent of rendering.
#[derive(Debug, Clone)]
pub struct ViewerState {
    /// Window title.
    pub title: String,
    pub file_name: String,
    pub sweep: usize,
    pub channel: usize,
    pub window: TimeWindow,
    /// The cropped trace.
    pub pairs: SamplePairs,
    pub x_label: String,
    pub y_label: String,
    pub stats: Option<SampleStats>,
}

impl ViewerState {
    pub fn new(
        recording: &Recording,
        sweep: usize,
        channel: usize,
        window: TimeWindow,
        pairs: SamplePairs,
    ) -> Self {
        let file_name = recording
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| recording.path.display().to_string());
        let y_label = recording
            .channels
            .get(channel)
            .map(|ch| format!("{} ({})", ch.name, ch.units))
            .unwrap_or_else(|| format!("Channel {channel}"));

        Self {
            title: format!("{file_name} – sweep {sweep}, channel {channel}"),
            file_name,
            sweep,
            channel,
            window,
            stats: pairs.stats(),
            pairs,
            x_label: "Time (s)".to_string(),
            y_label,
        }
    }

    /// Status line for the top bar.
    pub fn status_text(&self) -> String {
        let mut text = format!(
            "{}  |  sweep {}, channel {}  |  [{}, {}] s  |  {} samples",
            self.file_name,
            self.sweep,
            self.channel,
            self.window.lower,
            self.window.upper,
            self.pairs.len()
        );
        if let Some(s) = &self.stats {
            text.push_str(&format!(
                "  |  min={:.3}, max={:.3}, avg={:.3}, rms={:.3}",
                s.min, s.max, s.mean, s.rms
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::small_recording;

    #[test]
    fn test_labels_follow_channel() {
        let rec = small_recording();
        let pairs = rec.select_sweep(0, 1).unwrap();
        let state = ViewerState::new(&rec, 0, 1, TimeWindow::default(), pairs);
        assert_eq!(state.y_label, "IN 1 (pA)");
        assert_eq!(state.x_label, "Time (s)");
        assert_eq!(state.title, "cell.abf – sweep 0, channel 1");
        assert_eq!(state.stats.unwrap().min, -4.0);
    }

    #[test]
    fn test_status_text() {
        let rec = small_recording();
        let state = ViewerState::new(
            &rec,
            1,
            0,
            TimeWindow::new(0.0, 0.5),
            SamplePairs::default(),
        );
        let text = state.status_text();
        assert!(text.contains("sweep 1, channel 0"));
        assert!(text.contains("[0, 0.5] s"));
        assert!(text.ends_with("0 samples"));
    }
}
