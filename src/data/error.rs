use std::io;

use thiserror::Error;

/// Failures raised while reading an ABF file or selecting data from it.
#[derive(Error, Debug)]
pub enum AbfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown file signature {0:?}, expected \"ABF \" or \"ABF2\"")]
    UnknownSignature(String),

    #[error("File truncated: needed {needed} bytes but only {len} are available")]
    Truncated { needed: usize, len: usize },

    #[error("Unsupported data format code {0}")]
    UnsupportedDataFormat(i16),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error(
        "Invalid selection: sweep {sweep}, channel {channel} \
         (recording has {sweeps} sweeps and {channels} channels)"
    )]
    InvalidSelection {
        sweep: usize,
        channel: usize,
        sweeps: usize,
        channels: usize,
    },
}

pub type Result<T> = std::result::Result<T, AbfError>;
