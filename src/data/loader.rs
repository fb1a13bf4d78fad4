use std::path::{Path, PathBuf};

use super::error::{AbfError, Result};
use super::model::{Channel, OperationMode, Recording, Sweep};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

pub(crate) const BLOCK_SIZE: usize = 512;

/// Load an ABF recording.  Dispatch by file signature.
///
/// Supported formats:
/// * `"ABF "` – ABF 1.x (fixed-offset header, Clampex 9 and older)
/// * `"ABF2"` – ABF 2.x (section map, Clampex 10+)
pub fn load_file(path: &Path) -> Result<Recording> {
    let bytes = std::fs::read(path)?;
    let recording = parse_bytes(path.to_path_buf(), &bytes)?;
    log::info!(
        "Loaded {} (ABF v{}): {} channels, {} sweeps, {:.1} Hz",
        path.display(),
        recording.format_version,
        recording.channel_count(),
        recording.sweep_count(),
        recording.sample_rate_hz
    );
    Ok(recording)
}

/// Parse an in-memory ABF file.  `path` is only recorded on the result.
pub fn parse_bytes(path: PathBuf, bytes: &[u8]) -> Result<Recording> {
    let signature = slice(bytes, 0, 4)?;
    match signature {
        b"ABF2" => parse_abf2(path, bytes),
        b"ABF " => parse_abf1(path, bytes),
        other => Err(AbfError::UnknownSignature(latin1(other))),
    }
}

// ---------------------------------------------------------------------------
// Shared decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Int16,
    Float32,
}

impl DataFormat {
    fn from_code(code: i16) -> Result<Self> {
        match code {
            0 => Ok(DataFormat::Int16),
            1 => Ok(DataFormat::Float32),
            other => Err(AbfError::UnsupportedDataFormat(other)),
        }
    }

    fn bytes_per_point(self) -> usize {
        match self {
            DataFormat::Int16 => 2,
            DataFormat::Float32 => 4,
        }
    }
}

/// Per-channel conversion from raw ADC counts: `value = raw * gain + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scaling {
    gain: f64,
    offset: f64,
}

impl Scaling {
    const IDENTITY: Scaling = Scaling {
        gain: 1.0,
        offset: 0.0,
    };
}

/// Raw ADC calibration fields shared by both header versions.
struct AdcCalibration {
    programmable_gain: f32,
    instrument_scale_factor: f32,
    instrument_offset: f32,
    signal_gain: f32,
    signal_offset: f32,
    telegraph_enabled: bool,
    telegraph_addit_gain: f32,
}

impl AdcCalibration {
    fn scaling(&self, adc_range: f32, adc_resolution: i32, channel: usize) -> Result<Scaling> {
        let telegraph = if self.telegraph_enabled {
            self.telegraph_addit_gain as f64
        } else {
            1.0
        };
        let denominator = self.instrument_scale_factor as f64
            * self.signal_gain as f64
            * self.programmable_gain as f64
            * telegraph;
        if denominator == 0.0 || adc_resolution == 0 {
            return Err(AbfError::InvalidHeader(format!(
                "channel {channel} has a zero gain factor"
            )));
        }
        let gain = adc_range as f64 / adc_resolution as f64 / denominator;
        let offset = self.instrument_offset as f64 - self.signal_offset as f64;
        log::debug!("channel {channel}: gain={gain:e}, offset={offset}");
        Ok(Scaling { gain, offset })
    }
}

/// Layout of the data block, independent of the header version.
struct DataLayout {
    byte_start: usize,
    point_count: usize,
    format: DataFormat,
    channel_count: usize,
    sweep_count: usize,
    sample_rate_hz: f64,
}

/// De-interleave the data block into sweeps of per-channel traces.
fn decode_sweeps(bytes: &[u8], layout: &DataLayout, scaling: &[Scaling]) -> Result<Vec<Sweep>> {
    if layout.channel_count == 0 {
        return Err(AbfError::InvalidHeader("recording has no channels".to_string()));
    }
    if layout.sample_rate_hz <= 0.0 || !layout.sample_rate_hz.is_finite() {
        return Err(AbfError::InvalidHeader(format!(
            "invalid sample rate {}",
            layout.sample_rate_hz
        )));
    }

    let width = layout.format.bytes_per_point();
    let data_len = layout
        .point_count
        .checked_mul(width)
        .ok_or(AbfError::Truncated {
            needed: usize::MAX,
            len: bytes.len(),
        })?;
    let data = slice(bytes, layout.byte_start, data_len)?;

    // Counts are bounded by the bytes actually present before anything is allocated.
    let per_point = layout
        .sweep_count
        .checked_mul(layout.channel_count)
        .filter(|&n| n <= layout.point_count)
        .ok_or_else(|| {
            AbfError::InvalidHeader(format!(
                "{} sweeps of {} channels do not fit in {} points",
                layout.sweep_count, layout.channel_count, layout.point_count
            ))
        })?;
    let points_per_sweep = layout.point_count / per_point;
    if points_per_sweep == 0 {
        return Err(AbfError::InvalidHeader("recording has no samples".to_string()));
    }
    let times: Vec<f64> = (0..points_per_sweep)
        .map(|i| i as f64 / layout.sample_rate_hz)
        .collect();

    let sample_at = |index: usize, channel: usize| -> f64 {
        let raw = &data[index * width..(index + 1) * width];
        match layout.format {
            DataFormat::Int16 => {
                let count = i16::from_le_bytes([raw[0], raw[1]]) as f64;
                count * scaling[channel].gain + scaling[channel].offset
            }
            DataFormat::Float32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
        }
    };

    let sweeps = (0..layout.sweep_count)
        .map(|sweep| {
            let first = sweep * points_per_sweep * layout.channel_count;
            let traces = (0..layout.channel_count)
                .map(|channel| {
                    (0..points_per_sweep)
                        .map(|i| sample_at(first + i * layout.channel_count + channel, channel))
                        .collect()
                })
                .collect();
            Sweep {
                times: times.clone(),
                traces,
            }
        })
        .collect();

    Ok(sweeps)
}

/// Gap-free files and files reporting zero episodes hold a single sweep.
fn effective_sweep_count(mode: OperationMode, reported: i64) -> usize {
    if mode == OperationMode::GapFree || reported <= 0 {
        1
    } else {
        reported as usize
    }
}

// ---------------------------------------------------------------------------
// ABF2
// ---------------------------------------------------------------------------

/// One entry of the ABF2 section map.
#[derive(Debug, Clone, Copy)]
struct Section {
    block: u32,
    bytes: u32,
    entries: i64,
}

impl Section {
    fn read(bytes: &[u8], offset: usize) -> Result<Self> {
        Ok(Section {
            block: read_u32(bytes, offset)?,
            bytes: read_u32(bytes, offset + 4)?,
            entries: read_i64(bytes, offset + 8)?,
        })
    }

    fn start(&self) -> usize {
        self.block as usize * BLOCK_SIZE
    }
}

mod abf2 {
    // Header
    pub const FILE_VERSION: usize = 4;
    pub const ACTUAL_EPISODES: usize = 12;
    pub const DATA_FORMAT: usize = 30;
    pub const CREATOR_NAME_INDEX: usize = 60;
    pub const PROTOCOL_PATH_INDEX: usize = 72;

    // Section map
    pub const PROTOCOL_SECTION: usize = 76;
    pub const ADC_SECTION: usize = 92;
    pub const STRINGS_SECTION: usize = 220;
    pub const DATA_SECTION: usize = 236;
    pub const TAG_SECTION: usize = 252;

    // Protocol section
    pub const OPERATION_MODE: usize = 0;
    pub const ADC_SEQUENCE_INTERVAL: usize = 2;
    pub const ADC_RANGE: usize = 110;
    pub const ADC_RESOLUTION: usize = 118;

    // ADC section entry
    pub const TELEGRAPH_ENABLE: usize = 2;
    pub const TELEGRAPH_ADDIT_GAIN: usize = 6;
    pub const PROGRAMMABLE_GAIN: usize = 28;
    pub const INSTRUMENT_SCALE_FACTOR: usize = 40;
    pub const INSTRUMENT_OFFSET: usize = 44;
    pub const SIGNAL_GAIN: usize = 48;
    pub const SIGNAL_OFFSET: usize = 52;
    pub const CHANNEL_NAME_INDEX: usize = 74;
    pub const UNITS_INDEX: usize = 78;
    pub const ADC_ENTRY_MIN_BYTES: usize = UNITS_INDEX + 4;
}

fn parse_abf2(path: PathBuf, bytes: &[u8]) -> Result<Recording> {
    let version = slice(bytes, abf2::FILE_VERSION, 4)?;
    let format_version = format!("{}.{}.{}.{}", version[3], version[2], version[1], version[0]);

    let protocol = Section::read(bytes, abf2::PROTOCOL_SECTION)?;
    let adc = Section::read(bytes, abf2::ADC_SECTION)?;
    let strings = Section::read(bytes, abf2::STRINGS_SECTION)?;
    let data = Section::read(bytes, abf2::DATA_SECTION)?;
    let tags = Section::read(bytes, abf2::TAG_SECTION)?;
    log::debug!(
        "ABF2 sections: protocol@{} adc@{}x{} strings@{} data@{}x{}",
        protocol.start(),
        adc.start(),
        adc.entries,
        strings.start(),
        data.start(),
        data.entries
    );

    let p = protocol.start();
    let mode = OperationMode::from(read_i16(bytes, p + abf2::OPERATION_MODE)?);
    let sequence_interval_us = read_f32(bytes, p + abf2::ADC_SEQUENCE_INTERVAL)?;
    let adc_range = read_f32(bytes, p + abf2::ADC_RANGE)?;
    let adc_resolution = read_i32(bytes, p + abf2::ADC_RESOLUTION)?;

    let indexed = indexed_strings(slice(bytes, strings.start(), strings.bytes as usize)?);
    let lookup = |index: usize| indexed.get(index).filter(|s| !s.is_empty()).cloned();

    let format = DataFormat::from_code(read_i16(bytes, abf2::DATA_FORMAT)?)?;
    let channel_count = usize::try_from(adc.entries)
        .map_err(|_| AbfError::InvalidHeader(format!("negative ADC count {}", adc.entries)))?;
    if channel_count > 0 && (adc.bytes as usize) < abf2::ADC_ENTRY_MIN_BYTES {
        return Err(AbfError::InvalidHeader(format!(
            "ADC entries of {} bytes are too short",
            adc.bytes
        )));
    }
    let adc_len = channel_count
        .checked_mul(adc.bytes as usize)
        .ok_or(AbfError::Truncated {
            needed: usize::MAX,
            len: bytes.len(),
        })?;
    slice(bytes, adc.start(), adc_len)?;

    let mut channels = Vec::with_capacity(channel_count);
    let mut scaling = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let a = adc.start() + i * adc.bytes as usize;
        let name_index = read_i32(bytes, a + abf2::CHANNEL_NAME_INDEX)?;
        let units_index = read_i32(bytes, a + abf2::UNITS_INDEX)?;
        channels.push(Channel::new(
            lookup(name_index.max(0) as usize).unwrap_or_else(|| format!("IN {i}")),
            lookup(units_index.max(0) as usize).unwrap_or_else(|| "?".to_string()),
        ));

        scaling.push(match format {
            DataFormat::Float32 => Scaling::IDENTITY,
            DataFormat::Int16 => AdcCalibration {
                programmable_gain: read_f32(bytes, a + abf2::PROGRAMMABLE_GAIN)?,
                instrument_scale_factor: read_f32(bytes, a + abf2::INSTRUMENT_SCALE_FACTOR)?,
                instrument_offset: read_f32(bytes, a + abf2::INSTRUMENT_OFFSET)?,
                signal_gain: read_f32(bytes, a + abf2::SIGNAL_GAIN)?,
                signal_offset: read_f32(bytes, a + abf2::SIGNAL_OFFSET)?,
                telegraph_enabled: read_i16(bytes, a + abf2::TELEGRAPH_ENABLE)? == 1,
                telegraph_addit_gain: read_f32(bytes, a + abf2::TELEGRAPH_ADDIT_GAIN)?,
            }
            .scaling(adc_range, adc_resolution, i)?,
        });
    }

    if data.bytes as usize != format.bytes_per_point() {
        return Err(AbfError::InvalidHeader(format!(
            "data section stores {} bytes per point but format needs {}",
            data.bytes,
            format.bytes_per_point()
        )));
    }

    let layout = DataLayout {
        byte_start: data.start(),
        point_count: data.entries.max(0) as usize,
        format,
        channel_count,
        sweep_count: effective_sweep_count(mode, read_u32(bytes, abf2::ACTUAL_EPISODES)? as i64),
        sample_rate_hz: 1e6 / sequence_interval_us as f64,
    };
    let sweeps = decode_sweeps(bytes, &layout, &scaling)?;

    Ok(Recording {
        path,
        format_version,
        operation_mode: mode,
        sample_rate_hz: layout.sample_rate_hz,
        channels,
        protocol: lookup(read_u32(bytes, abf2::PROTOCOL_PATH_INDEX)? as usize)
            .map(|p| protocol_name(&p)),
        creator: lookup(read_u32(bytes, abf2::CREATOR_NAME_INDEX)? as usize),
        tag_count: tags.entries.max(0) as usize,
        sweeps,
    })
}

/// Split the ABF2 strings block into its indexed list.
///
/// The block opens with binary bookkeeping that ends in a double NUL; the
/// NUL-separated strings after it are addressed from index 1.
fn indexed_strings(block: &[u8]) -> Vec<String> {
    let end = block.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let block = &block[..end];
    let start = block
        .windows(2)
        .rposition(|w| w == [0, 0])
        .unwrap_or(0);
    block[start..]
        .split(|&b| b == 0)
        .skip(1)
        .map(latin1)
        .collect()
}

/// `C:\protocols\IV steps.pro` → `IV steps`
fn protocol_name(path: &str) -> String {
    let file = path.rsplit(|c| c == '\\' || c == '/').next().unwrap_or(path);
    match file.rfind('.') {
        Some(dot) if dot > 0 => file[..dot].to_string(),
        _ => file.to_string(),
    }
}

// ---------------------------------------------------------------------------
// ABF1
// ---------------------------------------------------------------------------

pub(crate) mod abf1 {
    pub const HEADER_SIZE: usize = 6144;
    pub const MIN_HEADER_SIZE: usize = 2048;
    pub const MAX_CHANNELS: usize = 16;

    pub const FILE_VERSION: usize = 4;
    pub const OPERATION_MODE: usize = 8;
    pub const ACTUAL_ACQ_LENGTH: usize = 10;
    pub const NUM_POINTS_IGNORED: usize = 14;
    pub const ACTUAL_EPISODES: usize = 16;
    pub const DATA_SECTION_PTR: usize = 40;
    pub const NUM_TAG_ENTRIES: usize = 48;
    pub const DATA_FORMAT: usize = 100;
    pub const ADC_NUM_CHANNELS: usize = 120;
    pub const ADC_SAMPLE_INTERVAL: usize = 122;
    pub const NUM_SAMPLES_PER_EPISODE: usize = 138;
    pub const ADC_RANGE: usize = 244;
    pub const ADC_RESOLUTION: usize = 252;
    pub const ADC_SAMPLING_SEQ: usize = 410;
    pub const ADC_CHANNEL_NAME: usize = 442;
    pub const ADC_CHANNEL_NAME_LEN: usize = 10;
    pub const ADC_UNITS: usize = 602;
    pub const ADC_UNITS_LEN: usize = 8;
    pub const ADC_PROGRAMMABLE_GAIN: usize = 730;
    pub const INSTRUMENT_SCALE_FACTOR: usize = 922;
    pub const INSTRUMENT_OFFSET: usize = 986;
    pub const SIGNAL_GAIN: usize = 1050;
    pub const SIGNAL_OFFSET: usize = 1114;
    pub const TELEGRAPH_ENABLE: usize = 4512;
    pub const TELEGRAPH_ADDIT_GAIN: usize = 4576;
}

fn parse_abf1(path: PathBuf, bytes: &[u8]) -> Result<Recording> {
    if bytes.len() < abf1::MIN_HEADER_SIZE {
        return Err(AbfError::Truncated {
            needed: abf1::MIN_HEADER_SIZE,
            len: bytes.len(),
        });
    }

    let version = read_f32(bytes, abf1::FILE_VERSION)?;
    let mode = OperationMode::from(read_i16(bytes, abf1::OPERATION_MODE)?);
    let format = DataFormat::from_code(read_i16(bytes, abf1::DATA_FORMAT)?)?;

    let channel_count = read_i16(bytes, abf1::ADC_NUM_CHANNELS)?;
    if channel_count <= 0 || channel_count as usize > abf1::MAX_CHANNELS {
        return Err(AbfError::InvalidHeader(format!(
            "invalid channel count {channel_count}"
        )));
    }
    let channel_count = channel_count as usize;

    let adc_range = read_f32(bytes, abf1::ADC_RANGE)?;
    let adc_resolution = read_i32(bytes, abf1::ADC_RESOLUTION)?;
    // The extended header (telegraph fields) only exists in files written by 1.8+.
    let has_extended = bytes.len() >= abf1::TELEGRAPH_ADDIT_GAIN + 4 * abf1::MAX_CHANNELS;

    let mut channels = Vec::with_capacity(channel_count);
    let mut scaling = Vec::with_capacity(channel_count);
    for i in 0..channel_count {
        let adc = read_i16(bytes, abf1::ADC_SAMPLING_SEQ + 2 * i)?;
        if adc < 0 || adc as usize >= abf1::MAX_CHANNELS {
            return Err(AbfError::InvalidHeader(format!(
                "channel {i} maps to invalid ADC {adc}"
            )));
        }
        let adc = adc as usize;

        let name = fixed_string(
            bytes,
            abf1::ADC_CHANNEL_NAME + adc * abf1::ADC_CHANNEL_NAME_LEN,
            abf1::ADC_CHANNEL_NAME_LEN,
        )?;
        let units = fixed_string(
            bytes,
            abf1::ADC_UNITS + adc * abf1::ADC_UNITS_LEN,
            abf1::ADC_UNITS_LEN,
        )?;
        channels.push(Channel::new(
            if name.is_empty() { format!("IN {adc}") } else { name },
            if units.is_empty() { "?".to_string() } else { units },
        ));

        scaling.push(match format {
            DataFormat::Float32 => Scaling::IDENTITY,
            DataFormat::Int16 => AdcCalibration {
                programmable_gain: read_f32(bytes, abf1::ADC_PROGRAMMABLE_GAIN + 4 * adc)?,
                instrument_scale_factor: read_f32(bytes, abf1::INSTRUMENT_SCALE_FACTOR + 4 * adc)?,
                instrument_offset: read_f32(bytes, abf1::INSTRUMENT_OFFSET + 4 * adc)?,
                signal_gain: read_f32(bytes, abf1::SIGNAL_GAIN + 4 * adc)?,
                signal_offset: read_f32(bytes, abf1::SIGNAL_OFFSET + 4 * adc)?,
                telegraph_enabled: has_extended
                    && read_i16(bytes, abf1::TELEGRAPH_ENABLE + 2 * adc)? == 1,
                telegraph_addit_gain: if has_extended {
                    read_f32(bytes, abf1::TELEGRAPH_ADDIT_GAIN + 4 * adc)?
                } else {
                    1.0
                },
            }
            .scaling(adc_range, adc_resolution, i)?,
        });
    }

    let data_block = read_i32(bytes, abf1::DATA_SECTION_PTR)?;
    let points_ignored = read_i16(bytes, abf1::NUM_POINTS_IGNORED)?;
    let point_count = read_i32(bytes, abf1::ACTUAL_ACQ_LENGTH)?;
    if data_block < 0 || points_ignored < 0 || point_count < 0 {
        return Err(AbfError::InvalidHeader(
            "negative data pointer or length".to_string(),
        ));
    }

    let sample_interval_us = read_f32(bytes, abf1::ADC_SAMPLE_INTERVAL)? as f64;
    let layout = DataLayout {
        byte_start: data_block as usize * BLOCK_SIZE
            + points_ignored as usize * format.bytes_per_point(),
        point_count: point_count as usize,
        format,
        channel_count,
        sweep_count: effective_sweep_count(mode, read_i32(bytes, abf1::ACTUAL_EPISODES)? as i64),
        sample_rate_hz: 1e6 / (sample_interval_us * channel_count as f64),
    };
    log::debug!(
        "ABF1 data: {} points from byte {}, {:?}",
        layout.point_count,
        layout.byte_start,
        layout.format
    );
    let sweeps = decode_sweeps(bytes, &layout, &scaling)?;

    Ok(Recording {
        path,
        format_version: format!("{version:.2}"),
        operation_mode: mode,
        sample_rate_hz: layout.sample_rate_hz,
        channels,
        protocol: None,
        creator: None,
        tag_count: read_i32(bytes, abf1::NUM_TAG_ENTRIES)?.max(0) as usize,
        sweeps,
    })
}

// ---------------------------------------------------------------------------
// Byte helpers (little-endian)
// ---------------------------------------------------------------------------

fn slice(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let needed = offset.checked_add(len).ok_or(AbfError::Truncated {
        needed: usize::MAX,
        len: bytes.len(),
    })?;
    bytes.get(offset..needed).ok_or(AbfError::Truncated {
        needed,
        len: bytes.len(),
    })
}

fn array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(slice(bytes, offset, N)?);
    Ok(out)
}

fn read_i16(bytes: &[u8], offset: usize) -> Result<i16> {
    array(bytes, offset).map(i16::from_le_bytes)
}

fn read_i32(bytes: &[u8], offset: usize) -> Result<i32> {
    array(bytes, offset).map(i32::from_le_bytes)
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    array(bytes, offset).map(u32::from_le_bytes)
}

fn read_i64(bytes: &[u8], offset: usize) -> Result<i64> {
    array(bytes, offset).map(i64::from_le_bytes)
}

fn read_f32(bytes: &[u8], offset: usize) -> Result<f32> {
    array(bytes, offset).map(f32::from_le_bytes)
}

/// Space/NUL padded text field.
fn fixed_string(bytes: &[u8], offset: usize, len: usize) -> Result<String> {
    let raw = slice(bytes, offset, len)?;
    Ok(latin1(raw)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string())
}

/// ABF text is single-byte; 0xB5 is the micro sign.
fn latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}
