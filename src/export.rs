use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::{aview1, stack, Axis};
use ndarray_npy::write_npy;
use serde::Serialize;

use crate::data::SamplePairs;

// ---------------------------------------------------------------------------
// Output naming
// ---------------------------------------------------------------------------

/// `<input up to first '.'>_channel_<c>_sweep_<s>.<extension>`
///
/// The truncation applies to the whole path string, so `recording.v2.abf`
/// yields `recording_…`. Unset indices are written as `None`.
pub fn output_path(
    input: &Path,
    channel: Option<usize>,
    sweep: Option<usize>,
    extension: &str,
) -> PathBuf {
    let input = input.to_string_lossy();
    let stem = input.split('.').next().unwrap_or_default();
    PathBuf::from(format!(
        "{stem}_channel_{}_sweep_{}.{extension}",
        index_label(channel),
        index_label(sweep)
    ))
}

fn index_label(index: Option<usize>) -> String {
    index.map_or_else(|| "None".to_string(), |i| i.to_string())
}

// ---------------------------------------------------------------------------
// numpy export
// ---------------------------------------------------------------------------

/// Write `[[times…], [values…]]` as a 2×N float64 `.npy` array.
///
/// An existing file at the output path is overwritten.
pub fn export_pair(
    pairs: &SamplePairs,
    input: &Path,
    channel: Option<usize>,
    sweep: Option<usize>,
) -> Result<PathBuf> {
    let out = output_path(input, channel, sweep, "np");
    let array = stack(Axis(0), &[aview1(&pairs.times), aview1(&pairs.values)])
        .context("stacking times and values")?;
    write_npy(&out, &array).with_context(|| format!("writing {}", out.display()))?;
    log::info!("Exported {} samples to {}", pairs.len(), out.display());
    Ok(out)
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SampleRow {
    time: f64,
    value: f64,
}

/// Write the pairs as a two-column `time,value` CSV next to the `.np` name.
pub fn export_csv(
    pairs: &SamplePairs,
    input: &Path,
    channel: Option<usize>,
    sweep: Option<usize>,
) -> Result<PathBuf> {
    let out = output_path(input, channel, sweep, "csv");
    let mut writer =
        csv::Writer::from_path(&out).with_context(|| format!("creating {}", out.display()))?;
    for (&time, &value) in pairs.times.iter().zip(&pairs.values) {
        writer
            .serialize(SampleRow { time, value })
            .context("writing CSV row")?;
    }
    // An empty crop still gets a header row.
    if pairs.is_empty() {
        writer
            .write_record(["time", "value"])
            .context("writing CSV header")?;
    }
    writer.flush().context("flushing CSV")?;
    log::info!("Exported {} samples to {}", pairs.len(), out.display());
    Ok(out)
}
