use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::{AbfError, Result};
use super::loader::{abf1, BLOCK_SIZE};

const ADC_RANGE: f32 = 10.0;
const ADC_RESOLUTION: i32 = 32768;
const FILE_VERSION: f32 = 1.83;
/// Episodic stimulation.
const OPERATION_MODE: i16 = 5;

/// Write single-channel episodic data as an ABF1 file with int16 samples.
///
/// Every sweep must have the same length. The ADC scale factor is chosen so
/// that the largest absolute value uses nearly the full int16 range.
pub fn write_abf1<P: AsRef<Path>>(
    path: P,
    sweeps: &[Vec<f64>],
    sample_rate_hz: f64,
    name: &str,
    units: &str,
) -> Result<()> {
    let points_per_sweep = sweeps.first().map_or(0, Vec::len);
    if sweeps.iter().any(|s| s.len() != points_per_sweep) {
        return Err(AbfError::InvalidHeader(
            "all sweeps must have the same length".to_string(),
        ));
    }
    if sample_rate_hz.is_nan() || sample_rate_hz <= 0.0 {
        return Err(AbfError::InvalidHeader(format!(
            "invalid sample rate {sample_rate_hz}"
        )));
    }

    let max_abs = sweeps
        .iter()
        .flatten()
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    let counts_per_unit = ADC_RANGE as f64 / ADC_RESOLUTION as f64;
    let gain = if max_abs > 0.0 {
        max_abs * 1.01 / i16::MAX as f64
    } else {
        counts_per_unit
    };
    let scale_factor = (counts_per_unit / gain) as f32;
    // Quantise with the same f32 factor the reader will see.
    let gain = counts_per_unit / scale_factor as f64;

    let total_points = points_per_sweep * sweeps.len();
    let mut header = vec![0u8; abf1::HEADER_SIZE];
    put(&mut header, 0, b"ABF ");
    put(&mut header, abf1::FILE_VERSION, &FILE_VERSION.to_le_bytes());
    put(&mut header, abf1::OPERATION_MODE, &OPERATION_MODE.to_le_bytes());
    put(&mut header, abf1::ACTUAL_ACQ_LENGTH, &(total_points as i32).to_le_bytes());
    put(&mut header, abf1::ACTUAL_EPISODES, &(sweeps.len() as i32).to_le_bytes());
    put(
        &mut header,
        abf1::DATA_SECTION_PTR,
        &((abf1::HEADER_SIZE / BLOCK_SIZE) as i32).to_le_bytes(),
    );
    put(&mut header, abf1::DATA_FORMAT, &0i16.to_le_bytes());
    put(&mut header, abf1::ADC_NUM_CHANNELS, &1i16.to_le_bytes());
    put(
        &mut header,
        abf1::ADC_SAMPLE_INTERVAL,
        &((1e6 / sample_rate_hz) as f32).to_le_bytes(),
    );
    put(
        &mut header,
        abf1::NUM_SAMPLES_PER_EPISODE,
        &(points_per_sweep as i32).to_le_bytes(),
    );
    put(&mut header, abf1::ADC_RANGE, &ADC_RANGE.to_le_bytes());
    put(&mut header, abf1::ADC_RESOLUTION, &ADC_RESOLUTION.to_le_bytes());
    put(&mut header, abf1::ADC_SAMPLING_SEQ, &0i16.to_le_bytes());
    put(&mut header, abf1::ADC_CHANNEL_NAME, &padded(name, abf1::ADC_CHANNEL_NAME_LEN));
    put(&mut header, abf1::ADC_UNITS, &padded(units, abf1::ADC_UNITS_LEN));
    for adc in 0..abf1::MAX_CHANNELS {
        put(&mut header, abf1::ADC_PROGRAMMABLE_GAIN + 4 * adc, &1f32.to_le_bytes());
        put(&mut header, abf1::INSTRUMENT_SCALE_FACTOR + 4 * adc, &1f32.to_le_bytes());
        put(&mut header, abf1::SIGNAL_GAIN + 4 * adc, &1f32.to_le_bytes());
        put(&mut header, abf1::TELEGRAPH_ADDIT_GAIN + 4 * adc, &1f32.to_le_bytes());
    }
    put(&mut header, abf1::INSTRUMENT_SCALE_FACTOR, &scale_factor.to_le_bytes());

    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&header)?;
    for value in sweeps.iter().flatten() {
        let count = (value / gain)
            .round()
            .clamp(i16::MIN as f64, i16::MAX as f64) as i16;
        writer.write_all(&count.to_le_bytes())?;
    }
    writer.flush()?;

    log::debug!(
        "wrote ABF1 with {} sweeps x {} points (gain {gain:e})",
        sweeps.len(),
        points_per_sweep
    );
    Ok(())
}

fn put(header: &mut [u8], offset: usize, bytes: &[u8]) {
    header[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Space-padded fixed-width field, truncated if too long.
fn padded(text: &str, len: usize) -> Vec<u8> {
    let mut out: Vec<u8> = text
        .chars()
        .map(|c| if c == 'µ' { 0xB5 } else if c.is_ascii() { c as u8 } else { b'?' })
        .take(len)
        .collect();
    out.resize(len, b' ');
    out
}
