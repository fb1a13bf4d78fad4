use std::fmt;
use std::path::PathBuf;

use super::error::{AbfError, Result};

// ---------------------------------------------------------------------------
// SamplePairs – aligned (time, value) vectors
// ---------------------------------------------------------------------------

/// One trace: `times` in seconds and the measured `values`, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplePairs {
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

impl SamplePairs {
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self { times, values }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Summary statistics of `values`, `None` for an empty trace.
    pub fn stats(&self) -> Option<SampleStats> {
        if self.values.is_empty() {
            return None;
        }
        let n = self.values.len() as f64;
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = self.values.iter().sum::<f64>() / n;
        let rms = (self.values.iter().map(|v| v * v).sum::<f64>() / n).sqrt();
        Some(SampleStats { min, max, mean, rms })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub rms: f64,
}

// ---------------------------------------------------------------------------
// Channel / Sweep
// ---------------------------------------------------------------------------

/// A recorded input channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub name: String,
    pub units: String,
}

impl Channel {
    pub fn new(name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            units: units.into(),
        }
    }
}

/// One acquisition segment: a shared time base and one value trace per channel.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub times: Vec<f64>,
    /// `traces[channel]` – same length as `times`.
    pub traces: Vec<Vec<f64>>,
}

/// Acquisition mode stored in the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    VariableLengthEvents,
    FixedLengthEvents,
    GapFree,
    HighSpeedOscilloscope,
    WaveformFixedLength,
    Unknown(i16),
}

impl From<i16> for OperationMode {
    fn from(code: i16) -> Self {
        match code {
            1 => OperationMode::VariableLengthEvents,
            2 => OperationMode::FixedLengthEvents,
            3 => OperationMode::GapFree,
            4 => OperationMode::HighSpeedOscilloscope,
            5 => OperationMode::WaveformFixedLength,
            other => OperationMode::Unknown(other),
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::VariableLengthEvents => write!(f, "variable-length events"),
            OperationMode::FixedLengthEvents => write!(f, "fixed-length events"),
            OperationMode::GapFree => write!(f, "gap-free"),
            OperationMode::HighSpeedOscilloscope => write!(f, "high-speed oscilloscope"),
            OperationMode::WaveformFixedLength => write!(f, "episodic stimulation"),
            OperationMode::Unknown(code) => write!(f, "unknown mode {code}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recording – the complete loaded file
// ---------------------------------------------------------------------------

/// A loaded ABF recording.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    /// e.g. `"2.0.0.0"` or `"1.83"`.
    pub format_version: String,
    pub operation_mode: OperationMode,
    /// Per-channel sampling rate.
    pub sample_rate_hz: f64,
    pub channels: Vec<Channel>,
    pub protocol: Option<String>,
    pub creator: Option<String>,
    pub tag_count: usize,
    pub sweeps: Vec<Sweep>,
}

impl Recording {
    pub fn sweep_count(&self) -> usize {
        self.sweeps.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per sweep per channel (0 for a recording without sweeps).
    pub fn sweep_point_count(&self) -> usize {
        self.sweeps.first().map_or(0, |s| s.times.len())
    }

    /// Total recorded duration across all sweeps, in seconds.
    pub fn total_duration_s(&self) -> f64 {
        if self.sample_rate_hz <= 0.0 {
            return 0.0;
        }
        (self.sweep_point_count() * self.sweep_count()) as f64 / self.sample_rate_hz
    }

    /// Copy out the `(times, values)` trace of one sweep/channel.
    pub fn select_sweep(&self, sweep: usize, channel: usize) -> Result<SamplePairs> {
        let invalid = || AbfError::InvalidSelection {
            sweep,
            channel,
            sweeps: self.sweep_count(),
            channels: self.channel_count(),
        };
        let sw = self.sweeps.get(sweep).ok_or_else(invalid)?;
        let trace = sw.traces.get(channel).ok_or_else(invalid)?;
        Ok(SamplePairs::new(sw.times.clone(), trace.clone()))
    }

    /// Multi-line description: the one-line overview plus per-channel details.
    pub fn summary(&self) -> String {
        let mut lines = vec![self.to_string(), String::new()];
        lines.push(format!("File: {}", self.path.display()));
        lines.push(format!("Operation mode: {}", self.operation_mode));
        lines.push(format!(
            "Sweep length: {} points ({:.4} s)",
            self.sweep_point_count(),
            if self.sample_rate_hz > 0.0 {
                self.sweep_point_count() as f64 / self.sample_rate_hz
            } else {
                0.0
            }
        ));
        if let Some(creator) = &self.creator {
            lines.push(format!("Creator: {creator}"));
        }
        lines.push("Channels:".to_string());
        for (i, ch) in self.channels.iter().enumerate() {
            lines.push(format!("  {i}: {} ({})", ch.name, ch.units));
        }
        lines.join("\n")
    }
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units: Vec<&str> = self.channels.iter().map(|c| c.units.as_str()).collect();
        let channel_word = if self.channel_count() == 1 { "channel" } else { "channels" };
        let sweep_word = if self.sweep_count() == 1 { "sweep" } else { "sweeps" };
        let tags = match self.tag_count {
            0 => "having no tags".to_string(),
            1 => "having 1 tag".to_string(),
            n => format!("having {n} tags"),
        };
        write!(
            f,
            "ABF (v{}) with {} {} ({}), sampled at {:.1} kHz, containing {} {}, {}, \
             with a total length of {:.2} minutes",
            self.format_version,
            self.channel_count(),
            channel_word,
            units.join(", "),
            self.sample_rate_hz / 1000.0,
            self.sweep_count(),
            sweep_word,
            tags,
            self.total_duration_s() / 60.0,
        )?;
        if let Some(protocol) = &self.protocol {
            write!(f, ", recorded with protocol \"{protocol}\"")?;
        }
        write!(f, ".")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two sweeps, two channels, 4 samples at 10 Hz; values `10 * sweep + 1..=4`.
    pub(crate) fn small_recording() -> Recording {
        let times = vec![0.0, 0.1, 0.2, 0.3];
        let sweeps = (0..2)
            .map(|s| Sweep {
                times: times.clone(),
                traces: vec![
                    (1..=4).map(|i| (10 * s + i) as f64).collect(),
                    (1..=4).map(|i| -((10 * s + i) as f64)).collect(),
                ],
            })
            .collect();
        Recording {
            path: PathBuf::from("cell.abf"),
            format_version: "2.0.0.0".to_string(),
            operation_mode: OperationMode::WaveformFixedLength,
            sample_rate_hz: 10.0,
            channels: vec![Channel::new("IN 0", "mV"), Channel::new("IN 1", "pA")],
            protocol: Some("steps".to_string()),
            creator: None,
            tag_count: 0,
            sweeps,
        }
    }

    #[test]
    fn test_select_sweep() {
        let rec = small_recording();
        let pairs = rec.select_sweep(1, 1).unwrap();
        assert_eq!(pairs.times, vec![0.0, 0.1, 0.2, 0.3]);
        assert_eq!(pairs.values, vec![-11.0, -12.0, -13.0, -14.0]);
    }

    #[test]
    fn test_select_sweep_out_of_range() {
        let rec = small_recording();
        let err = rec.select_sweep(2, 0).unwrap_err();
        assert!(matches!(
            err,
            AbfError::InvalidSelection {
                sweep: 2,
                channel: 0,
                sweeps: 2,
                channels: 2
            }
        ));
        assert!(matches!(
            rec.select_sweep(0, 5),
            Err(AbfError::InvalidSelection { channel: 5, .. })
        ));
    }

    #[test]
    fn test_display_summary_line() {
        let rec = small_recording();
        let text = rec.to_string();
        assert!(text.starts_with("ABF (v2.0.0.0) with 2 channels (mV, pA)"));
        assert!(text.contains("containing 2 sweeps"));
        assert!(text.contains("having no tags"));
        assert!(text.ends_with("recorded with protocol \"steps\"."));

        let summary = rec.summary();
        assert!(summary.contains("  1: IN 1 (pA)"));
        assert!(summary.contains("Sweep length: 4 points"));
    }

    #[test]
    fn test_stats() {
        let pairs = SamplePairs::new(vec![0.0, 1.0], vec![3.0, -4.0]);
        let stats = pairs.stats().unwrap();
        assert_eq!(stats.min, -4.0);
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.mean, -0.5);
        assert!((stats.rms - (12.5f64).sqrt()).abs() < 1e-12);
        assert!(SamplePairs::default().stats().is_none());
    }
}
