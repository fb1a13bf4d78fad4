use std::path::PathBuf;

use thiserror::Error;

use crate::data::TimeWindow;

// ---------------------------------------------------------------------------
// Command-line configuration
// ---------------------------------------------------------------------------

/// Everything the run needs, parsed once from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub filename: PathBuf,
    /// `None` when `--sweep` was not given.
    pub sweep: Option<usize>,
    /// `None` when `--channel` was not given.
    pub channel: Option<usize>,
    pub export: bool,
    /// With `export`, write CSV instead of a numpy array.
    pub csv: bool,
    pub window: TimeWindow,
}

impl Config {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            sweep: None,
            channel: None,
            export: false,
            csv: false,
            window: TimeWindow::default(),
        }
    }

    /// Sweep index used for data selection.
    pub fn sweep_index(&self) -> usize {
        self.sweep.unwrap_or(0)
    }

    /// Channel index used for data selection.
    pub fn channel_index(&self) -> usize {
        self.channel.unwrap_or(0)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} requires a value")]
    MissingValue(String),

    #[error("Invalid {flag} value: {value}")]
    InvalidValue { flag: String, value: String },

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    #[error("Missing required argument: filename")]
    MissingFilename,

    #[error("Unexpected extra argument: {0}")]
    ExtraArgument(String),
}

/// Parse arguments (without the program name).
///
/// Returns `Ok(None)` when `--help` was requested and printed.
pub fn parse_args(args: Vec<String>) -> Result<Option<Config>, ConfigError> {
    let mut filename: Option<PathBuf> = None;
    let mut config = Config::new(PathBuf::new());

    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        // `--flag=value` form.
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg, None),
        };
        let mut value = |name: &str| -> Result<String, ConfigError> {
            if let Some(v) = inline.clone() {
                return Ok(v);
            }
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| ConfigError::MissingValue(name.to_string()))
        };

        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "-s" | "--sweep" => {
                config.sweep = Some(parse_number("--sweep", value("--sweep")?)?);
            }
            "-c" | "--channel" => {
                config.channel = Some(parse_number("--channel", value("--channel")?)?);
            }
            "-l" | "--lower" => {
                config.window.lower = parse_number("--lower", value("--lower")?)?;
            }
            "-u" | "--upper" => {
                config.window.upper = parse_number("--upper", value("--upper")?)?;
            }
            "-e" | "--export" => config.export = switch("--export", &inline)?,
            "--csv" => config.csv = switch("--csv", &inline)?,
            other if other.starts_with('-') && other.len() > 1 && !looks_numeric(other) => {
                return Err(ConfigError::UnknownArgument(other.to_string()));
            }
            positional => {
                if filename.is_some() {
                    return Err(ConfigError::ExtraArgument(positional.to_string()));
                }
                filename = Some(PathBuf::from(positional));
            }
        }
        idx += 1;
    }

    config.filename = filename.ok_or(ConfigError::MissingFilename)?;
    Ok(Some(config))
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value,
    })
}

/// Boolean flags take no `=value`.
fn switch(flag: &str, inline: &Option<String>) -> Result<bool, ConfigError> {
    match inline {
        Some(value) => Err(ConfigError::InvalidValue {
            flag: flag.to_string(),
            value: value.clone(),
        }),
        None => Ok(true),
    }
}

fn looks_numeric(arg: &str) -> bool {
    arg.parse::<f64>().is_ok()
}

pub fn help_text() -> String {
    [
        "abf-crop",
        "",
        "Visualise or export one sweep/channel of an ABF recording, cropped to a time window.",
        "",
        "Usage:",
        "  abf-crop <filename> [options]",
        "",
        "Options:",
        "  -s, --sweep <usize>    Sweep to visualise (default: 0).",
        "  -c, --channel <usize>  Channel to extract (default: 0).",
        "  -e, --export           Write <name>_channel_<c>_sweep_<s>.np instead of plotting.",
        "      --csv              With --export, write a time,value CSV instead.",
        "  -l, --lower <f64>      Crop data to time interval [lower, upper] (default: 0).",
        "  -u, --upper <f64>      Crop data to time interval [lower, upper] (default: 1).",
        "  -h, --help             Show this help.",
        "",
        "Without --sweep, --channel or --export, a summary of the recording is printed.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = parse_args(args(&["cell.abf"])).unwrap().unwrap();
        assert_eq!(config, Config::new("cell.abf"));
        assert_eq!(config.window, TimeWindow::new(0.0, 1.0));
        assert_eq!(config.sweep_index(), 0);
        assert_eq!(config.channel_index(), 0);
    }

    #[test]
    fn test_all_flags() {
        let config = parse_args(args(&[
            "-s", "3", "--channel", "1", "cell.abf", "-e", "-l", "-0.5", "--upper=2.25", "--csv",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(config.filename, PathBuf::from("cell.abf"));
        assert_eq!(config.sweep, Some(3));
        assert_eq!(config.channel, Some(1));
        assert!(config.export);
        assert!(config.csv);
        assert_eq!(config.window, TimeWindow::new(-0.5, 2.25));
    }

    #[test]
    fn test_help_returns_none() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), None);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse_args(args(&["cell.abf", "-s"])),
            Err(ConfigError::MissingValue("--sweep".to_string()))
        );
        assert_eq!(
            parse_args(args(&["cell.abf", "-c", "one"])),
            Err(ConfigError::InvalidValue {
                flag: "--channel".to_string(),
                value: "one".to_string()
            })
        );
        assert_eq!(
            parse_args(args(&["cell.abf", "-s", "-1"])),
            Err(ConfigError::InvalidValue {
                flag: "--sweep".to_string(),
                value: "-1".to_string()
            })
        );
        assert_eq!(
            parse_args(args(&["cell.abf", "--verbose"])),
            Err(ConfigError::UnknownArgument("--verbose".to_string()))
        );
        assert_eq!(parse_args(args(&["-e"])), Err(ConfigError::MissingFilename));
        assert_eq!(
            parse_args(args(&["cell.abf", "--export=1"])),
            Err(ConfigError::InvalidValue {
                flag: "--export".to_string(),
                value: "1".to_string()
            })
        );
        assert_eq!(
            parse_args(args(&["cell.abf", "-e", "--csv=foo"])),
            Err(ConfigError::InvalidValue {
                flag: "--csv".to_string(),
                value: "foo".to_string()
            })
        );
        assert_eq!(
            parse_args(args(&["a.abf", "b.abf"])),
            Err(ConfigError::ExtraArgument("b.abf".to_string()))
        );
    }
}
