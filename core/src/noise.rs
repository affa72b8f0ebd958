//! Synthetic channel impairments for stress-testing the demodulator
//!
//! Severity is a step function of [`NoiseLevel`]:
//!
//! | level | white σ | hum amp | impulses | band noise |
//! |-------|---------|---------|----------|------------|
//! | 0     | -       | -       | -        | -          |
//! | 1     | 500     | 1000    | -        | -          |
//! | 2     | 1000    | 2000    | -        | -          |
//! | 3     | 1500    | 3000    | yes      | -          |
//! | 4     | 4000    | 4000    | yes      | yes        |
//! | 5     | 8000    | 5000    | yes      | yes        |
//!
//! Random draws always happen in the same order (hum frequency, white noise,
//! impulses, band-noise phases) so a seeded generator reproduces a run.

use crate::config::FrequencyBand;
use crate::error::{ModemError, Result};
use crate::wav::{clip_sample, Waveform};
use crate::MAX_SAMPLE;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// White noise standard deviation per level; the top two levels jump well
/// past the linear trend.
const WHITE_NOISE_SIGMA: [f64; 6] = [0.0, 500.0, 1000.0, 1500.0, 4000.0, 8000.0];

/// Hum amplitude per level step
const HUM_AMPLITUDE_STEP: f64 = 1000.0;

/// Mains frequencies the hum is drawn from
const HUM_FREQUENCIES: [f64; 2] = [50.0, 60.0];

/// Impulses per sample per level step
const IMPULSE_DENSITY: f64 = 0.0005;

/// Impulse amplitude per level step, before per-spike clipping
const IMPULSE_AMPLITUDE_STEP: f64 = 10000.0;

/// Number of sinusoids swept across the jam band
const BAND_NOISE_TONES: usize = 8;

/// Amplitude of each band-noise tone per level step
const BAND_NOISE_AMPLITUDE_STEP: f64 = 250.0;

/// Integer noise severity, `0..=NoiseLevel::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NoiseLevel(u8);

impl NoiseLevel {
    pub const MAX: u8 = 5;
    pub const NONE: NoiseLevel = NoiseLevel(0);

    /// Lowest level that injects impulse noise
    pub const IMPULSE_THRESHOLD: u8 = 3;

    /// Lowest level that injects band noise
    pub const BAND_NOISE_THRESHOLD: u8 = 4;

    pub fn new(level: u8) -> Result<Self> {
        if level > Self::MAX {
            return Err(ModemError::InvalidNoiseLevel(level));
        }
        Ok(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn all() -> impl Iterator<Item = NoiseLevel> {
        (0..=Self::MAX).map(NoiseLevel)
    }

    pub fn white_sigma(self) -> f64 {
        WHITE_NOISE_SIGMA[self.0 as usize]
    }

    pub fn hum_amplitude(self) -> f64 {
        HUM_AMPLITUDE_STEP * self.0 as f64
    }

    pub fn has_impulses(self) -> bool {
        self.0 >= Self::IMPULSE_THRESHOLD
    }

    pub fn impulse_count(self, len: usize) -> usize {
        if !self.has_impulses() {
            return 0;
        }
        (len as f64 * IMPULSE_DENSITY * self.0 as f64) as usize
    }

    pub fn impulse_amplitude(self) -> f64 {
        (IMPULSE_AMPLITUDE_STEP * self.0 as f64).min(MAX_SAMPLE as f64)
    }

    pub fn has_band_noise(self) -> bool {
        self.0 >= Self::BAND_NOISE_THRESHOLD
    }

    pub fn band_noise_amplitude(self) -> f64 {
        BAND_NOISE_AMPLITUDE_STEP * self.0 as f64
    }
}

impl TryFrom<u8> for NoiseLevel {
    type Error = ModemError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl std::fmt::Display for NoiseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The additive noise alone, before it is mixed into a signal.
///
/// `jam_band` is the range the band-noise tones are spread over; it should
/// match the band the demodulator searches.
pub fn impairment<R: Rng + ?Sized>(
    len: usize,
    sample_rate: u32,
    level: NoiseLevel,
    jam_band: &FrequencyBand,
    rng: &mut R,
) -> Vec<f64> {
    let mut noise = vec![0.0f64; len];
    if level.is_none() || len == 0 {
        return noise;
    }

    let rate = sample_rate as f64;
    let hum_freq = if rng.gen_bool(0.5) {
        HUM_FREQUENCIES[0]
    } else {
        HUM_FREQUENCIES[1]
    };
    let hum_amp = level.hum_amplitude();
    let sigma = level.white_sigma();

    for (i, value) in noise.iter_mut().enumerate() {
        let z: f64 = rng.sample(StandardNormal);
        let t = i as f64 / rate;
        *value = sigma * z + hum_amp * (2.0 * PI * hum_freq * t).sin();
    }

    let pulses = level.impulse_count(len);
    if pulses > 0 {
        let pulse_amp = level.impulse_amplitude();
        let mut spikes = vec![0.0f64; len];
        for _ in 0..pulses {
            let idx = rng.gen_range(0..len);
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            // A later spike at the same position replaces the earlier one
            spikes[idx] = sign * pulse_amp;
        }
        for (value, spike) in noise.iter_mut().zip(spikes) {
            *value += spike;
        }
    }

    if level.has_band_noise() {
        let amp = level.band_noise_amplitude();
        let step = jam_band.width() / (BAND_NOISE_TONES - 1) as f64;
        for tone in 0..BAND_NOISE_TONES {
            let freq = jam_band.low + step * tone as f64;
            let phase = rng.gen_range(0.0..2.0 * PI);
            for (i, value) in noise.iter_mut().enumerate() {
                let t = i as f64 / rate;
                *value += amp * (2.0 * PI * freq * t + phase).sin();
            }
        }
    }

    log::debug!(
        "Generated level {} impairment over {} samples ({} Hz hum, {} impulses, band noise: {})",
        level,
        len,
        hum_freq,
        pulses,
        level.has_band_noise()
    );
    noise
}

/// Mix channel noise into `samples` and clip the result to 16-bit range.
///
/// Level 0 returns the input unchanged and draws nothing from `rng`.
pub fn apply_noise<R: Rng + ?Sized>(
    samples: &[i16],
    sample_rate: u32,
    level: NoiseLevel,
    jam_band: &FrequencyBand,
    rng: &mut R,
) -> Vec<i16> {
    if level.is_none() {
        return samples.to_vec();
    }

    let noise = impairment(samples.len(), sample_rate, level, jam_band, rng);
    samples
        .iter()
        .zip(noise.iter())
        .map(|(&s, &n)| clip_sample(s as f64 + n))
        .collect()
}

/// Root-mean-square magnitude
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Noise source bundling a severity, a jam band and its own generator
pub struct ChannelNoise {
    level: NoiseLevel,
    jam_band: FrequencyBand,
    rng: StdRng,
}

impl ChannelNoise {
    /// Non-deterministic source seeded from the OS
    pub fn new(level: NoiseLevel, jam_band: FrequencyBand) -> Self {
        Self {
            level,
            jam_band,
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible source
    pub fn with_seed(level: NoiseLevel, jam_band: FrequencyBand, seed: u64) -> Self {
        Self {
            level,
            jam_band,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn level(&self) -> NoiseLevel {
        self.level
    }

    pub fn jam_band(&self) -> FrequencyBand {
        self.jam_band
    }

    pub fn apply(&mut self, waveform: &Waveform) -> Waveform {
        let samples = apply_noise(
            &waveform.samples,
            waveform.sample_rate,
            self.level,
            &self.jam_band,
            &mut self.rng,
        );
        Waveform::new(samples, waveform.sample_rate)
    }

    pub fn impairment(&mut self, len: usize, sample_rate: u32) -> Vec<f64> {
        impairment(len, sample_rate, self.level, &self.jam_band, &mut self.rng)
    }
}
