use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::data::loader::load_file;
use crate::data::{Recording, SamplePairs, TimeWindow};
use crate::export::{export_csv, export_pair};
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Sweep extraction
// ---------------------------------------------------------------------------

/// Take one sweep/channel from the recording and crop it to `window`.
///
/// An inverted window is not an error; it just yields no samples.
pub fn select_window(
    recording: &Recording,
    sweep: usize,
    channel: usize,
    window: TimeWindow,
) -> Result<SamplePairs> {
    let raw = recording
        .select_sweep(sweep, channel)
        .with_context(|| format!("selecting sweep {sweep}, channel {channel}"))?;
    let cropped = window.filter(&raw);
    if cropped.is_empty() {
        log::warn!(
            "Window [{}, {}] keeps none of the {} samples of sweep {sweep}, channel {channel}",
            window.lower,
            window.upper,
            raw.len()
        );
    }
    Ok(cropped)
}

// ---------------------------------------------------------------------------
// Mode switch
// ---------------------------------------------------------------------------

/// What a run does with the loaded recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Write the cropped trace to disk; no window is shown.
    Export,
    /// Neither sweep nor channel was given: print the recording metadata.
    Summary,
    /// Show the cropped trace in a plot window.
    Plot,
}

impl Mode {
    pub fn from_config(config: &Config) -> Self {
        if config.export {
            Mode::Export
        } else if config.sweep.is_none() && config.channel.is_none() {
            Mode::Summary
        } else {
            Mode::Plot
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Exported(PathBuf),
    Summary(String),
    /// The plot was shown and its window has been closed.
    Plotted,
}

/// Load the configured file and carry out the selected mode.
pub fn run(config: &Config) -> Result<Outcome> {
    let recording = load_file(&config.filename)
        .with_context(|| format!("loading {}", config.filename.display()))?;
    run_with(config, &recording, crate::app::render_plot)
}

/// Same as [`run`], for an already loaded recording and a caller-supplied plot sink.
pub fn run_with<F>(config: &Config, recording: &Recording, render: F) -> Result<Outcome>
where
    F: FnOnce(ViewerState) -> Result<()>,
{
    match Mode::from_config(config) {
        Mode::Export => {
            let pairs = select_window(
                recording,
                config.sweep_index(),
                config.channel_index(),
                config.window,
            )?;
            let out = if config.csv {
                export_csv(&pairs, &config.filename, config.channel, config.sweep)?
            } else {
                export_pair(&pairs, &config.filename, config.channel, config.sweep)?
            };
            Ok(Outcome::Exported(out))
        }
        Mode::Summary => Ok(Outcome::Summary(recording.summary())),
        Mode::Plot => {
            let pairs = select_window(
                recording,
                config.sweep_index(),
                config.channel_index(),
                config.window,
            )?;
            let state = ViewerState::new(
                recording,
                config.sweep_index(),
                config.channel_index(),
                config.window,
                pairs,
            );
            render(state)?;
            Ok(Outcome::Plotted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::small_recording;

    #[test]
    fn test_mode_switch() {
        let mut config = Config::new("cell.abf");
        assert_eq!(Mode::from_config(&config), Mode::Summary);

        config.channel = Some(0);
        assert_eq!(Mode::from_config(&config), Mode::Plot);

        config.channel = None;
        config.sweep = Some(1);
        assert_eq!(Mode::from_config(&config), Mode::Plot);

        config.export = true;
        assert_eq!(Mode::from_config(&config), Mode::Export);

        config.sweep = None;
        assert_eq!(Mode::from_config(&config), Mode::Export);
    }

    #[test]
    fn test_select_window_crops() {
        let rec = small_recording();
        let pairs = select_window(&rec, 1, 0, TimeWindow::new(0.1, 0.2)).unwrap();
        assert_eq!(pairs.times, vec![0.1, 0.2]);
        assert_eq!(pairs.values, vec![12.0, 13.0]);
    }

    #[test]
    fn test_select_window_inverted_is_empty() {
        let rec = small_recording();
        let pairs = select_window(&rec, 0, 0, TimeWindow::new(0.3, 0.1)).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_select_window_bad_index_keeps_typed_error() {
        let rec = small_recording();
        let err = select_window(&rec, 9, 0, TimeWindow::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::data::AbfError>(),
            Some(crate::data::AbfError::InvalidSelection { sweep: 9, .. })
        ));
    }

    #[test]
    fn test_summary_mode_does_not_render() {
        let rec = small_recording();
        let config = Config::new("cell.abf");
        let outcome = run_with(&config, &rec, |_| panic!("plot must not open")).unwrap();
        match outcome {
            Outcome::Summary(text) => assert!(text.contains("2 channels")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_plot_mode_hands_cropped_trace_to_viewer() {
        let rec = small_recording();
        let mut config = Config::new("cell.abf");
        config.sweep = Some(0);
        config.window = TimeWindow::new(0.0, 0.15);

        let mut seen = None;
        let outcome = run_with(&config, &rec, |state| {
            seen = Some(state);
            Ok(())
        })
        .unwrap();
        assert_eq!(outcome, Outcome::Plotted);

        let state = seen.unwrap();
        assert_eq!(state.pairs.times, vec![0.0, 0.1]);
        assert_eq!(state.channel, 0);
        assert_eq!(state.y_label, "IN 0 (mV)");
    }
}
