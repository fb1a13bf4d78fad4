/// Data layer: recording model, ABF loading, and time-window filtering.
///
/// Architecture:
/// ```text
///   .abf (v1 / v2)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse header + data block → Recording
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ Recording  │  sweeps × channels, shared time base per sweep
///   └───────────┘
///        │  select_sweep(sweep, channel)
///        ▼
///   ┌──────────┐
///   │  filter   │  lower <= t <= upper → SamplePairs
///   └──────────┘
/// ```

pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;

pub use error::AbfError;
pub use filter::TimeWindow;
pub use model::{Channel, Recording, SamplePairs};
