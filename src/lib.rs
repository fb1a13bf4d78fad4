//! # abf-crop
//!
//! Crop one sweep/channel of an Axon Binary Format (ABF) recording to a time
//! window, then plot it or export it as a numpy array.
//!
//! ```no_run
//! use abf_crop::data::loader::load_file;
//! use abf_crop::data::TimeWindow;
//! use abf_crop::selector::select_window;
//!
//! let recording = load_file("cell.abf".as_ref()).expect("load");
//! println!("{recording}");
//! let pairs = select_window(&recording, 0, 0, TimeWindow::new(0.2, 1.0)).expect("select");
//! println!("{} samples", pairs.len());
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod export;
pub mod selector;
pub mod state;
pub mod ui;
