// Command-line tests: exit codes and output of the `abf-crop` binary.

use std::process::{Command, Output};

use abf_crop::data::writer::write_abf1;
use ndarray::Array2;
use ndarray_npy::read_npy;
use tempfile::TempDir;

/// Run the binary inside `dir`, so relative file names stay free of dotted parents.
fn abf_crop(dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_abf-crop"))
        .args(args)
        .current_dir(dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run abf-crop")
}

fn scratch() -> TempDir {
    tempfile::Builder::new()
        .prefix("abfcrop")
        .tempdir()
        .expect("Failed to create temp dir")
}

#[test]
fn test_help_exits_zero() {
    let dir = scratch();
    let out = abf_crop(&dir, &["--help"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage:"));
}

#[test]
fn test_bad_argument_exits_two_with_usage() {
    let dir = scratch();
    let out = abf_crop(&dir, &["cell.abf", "-s", "x"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid --sweep value: x"), "{stderr}");
    assert!(stderr.contains("Usage:"), "{stderr}");
}

#[test]
fn test_missing_filename_exits_two() {
    let dir = scratch();
    let out = abf_crop(&dir, &["-e"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_missing_file_exits_one() {
    let dir = scratch();
    let out = abf_crop(&dir, &["absent.abf", "-e"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("loading absent.abf"), "{stderr}");
}

#[test]
fn test_export_writes_array() {
    let dir = scratch();
    let sweeps = vec![(0..10).map(|i| i as f64).collect::<Vec<_>>()];
    write_abf1(dir.path().join("steps.abf"), &sweeps, 10.0, "Vm", "mV").expect("write ABF1");

    let out = abf_crop(&dir, &["steps.abf", "-e", "-c", "0", "-s", "0", "-u", "0.5"]);
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("steps_channel_0_sweep_0.np"));

    let arr: Array2<f64> =
        read_npy(dir.path().join("steps_channel_0_sweep_0.np")).expect("read back .np");
    assert_eq!(arr.shape(), &[2, 6]);
}

#[test]
fn test_out_of_range_sweep_exits_one() {
    let dir = scratch();
    write_abf1(dir.path().join("steps.abf"), &[vec![0.0; 4]], 10.0, "Vm", "mV")
        .expect("write ABF1");

    let out = abf_crop(&dir, &["steps.abf", "-e", "-s", "5"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.path().join("steps_channel_None_sweep_5.np").exists());
}

#[test]
fn test_summary_prints_metadata() {
    let dir = scratch();
    write_abf1(dir.path().join("steps.abf"), &[vec![0.0; 4]], 10.0, "Vm", "mV")
        .expect("write ABF1");

    let out = abf_crop(&dir, &["steps.abf"]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("with 1 channel (mV)"), "{stdout}");
}
