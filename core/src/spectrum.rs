//! Magnitude spectrum of a single analysis window
//!
//! The window is zero-padded to `2^(ceil(log2(len)) + 1)` points, which is
//! always strictly longer than the window itself. Bins come back in the usual
//! FFT order: non-negative frequencies first, then the negative image.

use crate::config::FrequencyBand;
use rustfft::{num_complex::Complex, FftPlanner};

/// Bin center frequencies and magnitudes, index-aligned
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Spacing between adjacent bins in Hz
    pub fn resolution(&self) -> Option<f64> {
        if self.frequencies.len() < 2 {
            return None;
        }
        Some(self.frequencies[1] - self.frequencies[0])
    }

    /// Frequency of the strongest bin inside `band`.
    ///
    /// The first bin wins on ties. `None` when no bin falls inside the band.
    pub fn peak_in_band(&self, band: &FrequencyBand) -> Option<f64> {
        let mut peak: Option<(f64, f64)> = None;
        for (&freq, &magnitude) in self.frequencies.iter().zip(self.magnitudes.iter()) {
            if !band.contains(freq) {
                continue;
            }
            match peak {
                Some((_, best)) if magnitude <= best => {}
                _ => peak = Some((freq, magnitude)),
            }
        }
        peak.map(|(freq, _)| freq)
    }
}

/// FFT length used for a window of `len` samples
pub fn fft_size(len: usize) -> usize {
    len.max(1).next_power_of_two() * 2
}

/// Bin center frequencies for an `n`-point FFT, negative bins included
pub fn fft_frequencies(n: usize, sample_rate: u32) -> Vec<f64> {
    let spacing = sample_rate as f64 / n as f64;
    let positive = (n + 1) / 2;
    (0..n)
        .map(|k| {
            let signed = if k < positive {
                k as i64
            } else {
                k as i64 - n as i64
            };
            signed as f64 * spacing
        })
        .collect()
}

/// Zero-padded magnitude spectrum of `segment`.
pub fn analyze(segment: &[i16], sample_rate: u32) -> Spectrum {
    if segment.is_empty() {
        return Spectrum::default();
    }

    let n = fft_size(segment.len());
    let mut buffer: Vec<Complex<f64>> = segment
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    buffer.resize(n, Complex::new(0.0, 0.0));

    // FftPlanner caches plans internally; one per call keeps this stateless
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    Spectrum {
        frequencies: fft_frequencies(n, sample_rate),
        magnitudes: buffer.iter().map(|c| c.norm()).collect(),
    }
}
