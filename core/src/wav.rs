//! Mono 16-bit PCM sample buffers and their WAV container

use crate::error::{ModemError, Result};
use crate::MAX_SAMPLE;
use hound::{SampleFormat, WavSpec};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Signed 16-bit mono samples at a given sample rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Round and clip a sample value to `[-MAX_SAMPLE, MAX_SAMPLE]`.
pub fn clip_sample(value: f64) -> i16 {
    let limit = MAX_SAMPLE as f64;
    value.round().clamp(-limit, limit) as i16
}

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

pub fn write_wav<P: AsRef<Path>>(path: P, waveform: &Waveform) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(File::create(path)?);
    let mut writer = hound::WavWriter::new(file, wav_spec(waveform.sample_rate))?;
    for &sample in &waveform.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    log::info!(
        "Wrote {} samples ({:.2} s) to {}",
        waveform.len(),
        waveform.duration(),
        path.display()
    );
    Ok(())
}

/// Read a mono 16-bit PCM WAV file.
///
/// A missing file is [`ModemError::ResourceNotFound`]; any other layout is
/// [`ModemError::UnsupportedFormat`].
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ModemError::ResourceNotFound(path.to_path_buf()));
    }

    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(ModemError::UnsupportedFormat(format!(
            "expected mono, got {} channels",
            spec.channels
        )));
    }
    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        return Err(ModemError::UnsupportedFormat(format!(
            "expected 16-bit integer PCM, got {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()?;

    log::debug!(
        "Read {} samples at {} Hz from {}",
        samples.len(),
        spec.sample_rate,
        path.display()
    );
    Ok(Waveform::new(samples, spec.sample_rate))
}
