use crate::codec::{Bit, BitString};
use crate::config::{CarrierPair, EmptyBandPolicy, FrequencyBand, SymbolTiming};
use crate::error::Result;
use crate::spectrum::analyze;
use crate::wav::{clip_sample, read_wav, Waveform};
use crate::DEFAULT_AMPLITUDE;
use std::f64::consts::PI;
use std::path::Path;

// Binary FSK over fixed-length symbol windows
//
// Modulation:
// - One pure tone per symbol: `space` for 0, `mark` for 1
// - Phase restarts at 0 on every symbol, so boundaries may click
// - No preamble, no framing, no error correction
//
// Demodulation:
// - Windows of `samples_per_symbol` samples, the last one possibly shorter
// - Zero-padded FFT per window, peak picked inside the validity band
// - Nearest carrier wins

/// Symbol rendered for a window left unclassified by [`EmptyBandPolicy::Erase`]
pub const ERASED_SYMBOL: char = '?';

/// FSK modulator - turns a bit string into a sampled tone sequence
pub struct FskModulator {
    timing: SymbolTiming,
    carriers: CarrierPair,
    amplitude: f64,
}

impl FskModulator {
    pub fn new(timing: SymbolTiming, carriers: CarrierPair) -> Result<Self> {
        timing.validate()?;
        carriers.validate()?;
        Ok(Self {
            timing,
            carriers,
            amplitude: DEFAULT_AMPLITUDE,
        })
    }

    /// Peak amplitude before clipping (default 32767)
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn timing(&self) -> SymbolTiming {
        self.timing
    }

    pub fn carriers(&self) -> CarrierPair {
        self.carriers
    }

    /// Samples for a single tone, phase starting at 0
    fn tone(&self, frequency: f64) -> Vec<i16> {
        let rate = self.timing.sample_rate as f64;
        let angular_freq = 2.0 * PI * frequency / rate;
        (0..self.timing.samples_per_symbol())
            .map(|i| clip_sample(self.amplitude * (angular_freq * i as f64).sin()))
            .collect()
    }

    /// Modulate every `0`/`1` symbol of `bits`.
    ///
    /// Any other character is skipped with a warning; the output is shorter
    /// by one symbol for each.
    pub fn modulate<B: AsRef<str>>(&self, bits: B) -> Waveform {
        let bits = bits.as_ref();
        let space = self.tone(self.carriers.space);
        let mark = self.tone(self.carriers.mark);

        let mut samples = Vec::with_capacity(bits.len() * space.len());
        let mut skipped = 0usize;
        for (idx, symbol) in bits.chars().enumerate() {
            match symbol {
                '0' => samples.extend_from_slice(&space),
                '1' => samples.extend_from_slice(&mark),
                other => {
                    log::warn!("Invalid symbol {:?} at position {} (skipped)", other, idx);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} invalid symbols", skipped);
        }
        Waveform::new(samples, self.timing.sample_rate)
    }

    /// Expected output length for `bits`
    pub fn output_len(&self, bits: &str) -> usize {
        let valid = bits.chars().filter(|c| *c == '0' || *c == '1').count();
        valid * self.timing.samples_per_symbol()
    }
}

/// Outcome for one analysis window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDecision {
    pub index: usize,
    /// Samples in the window; less than a full symbol only for the last one
    pub len: usize,
    /// Strongest in-band frequency, `None` when no bin fell inside the band
    pub peak_hz: Option<f64>,
    /// `None` when the window was erased
    pub bit: Option<Bit>,
}

impl WindowDecision {
    pub fn symbol(&self) -> char {
        self.bit.map(Bit::as_char).unwrap_or(ERASED_SYMBOL)
    }
}

/// Per-window decisions, in window order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedSymbols {
    pub windows: Vec<WindowDecision>,
    pub samples_per_symbol: usize,
}

impl DecodedSymbols {
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn bits(&self) -> BitString {
        let mut bits = BitString::with_capacity(self.windows.len());
        for window in &self.windows {
            bits.push_symbol(window.symbol());
        }
        bits
    }

    /// Windows with no in-band energy
    pub fn empty_band_count(&self) -> usize {
        self.windows.iter().filter(|w| w.peak_hz.is_none()).count()
    }

    pub fn erased_count(&self) -> usize {
        self.windows.iter().filter(|w| w.bit.is_none()).count()
    }

    /// `true` when the final window held fewer samples than a full symbol
    pub fn has_short_final_window(&self) -> bool {
        self.windows
            .last()
            .map(|w| w.len < self.samples_per_symbol)
            .unwrap_or(false)
    }
}

/// FSK demodulator - segment-wise spectral peak detection
pub struct FskDemodulator {
    timing: SymbolTiming,
    carriers: CarrierPair,
    band: FrequencyBand,
    empty_band_policy: EmptyBandPolicy,
}

impl FskDemodulator {
    pub fn new(
        timing: SymbolTiming,
        carriers: CarrierPair,
        band: FrequencyBand,
    ) -> Result<Self> {
        timing.validate()?;
        carriers.validate()?;
        band.validate()?;
        band.check_brackets(&carriers)?;
        Ok(Self {
            timing,
            carriers,
            band,
            empty_band_policy: EmptyBandPolicy::default(),
        })
    }

    pub fn with_empty_band_policy(mut self, policy: EmptyBandPolicy) -> Self {
        self.empty_band_policy = policy;
        self
    }

    pub fn band(&self) -> FrequencyBand {
        self.band
    }

    /// Nearest-carrier rule: `0` only when strictly closer to `space`.
    pub fn classify(&self, peak_hz: f64) -> Bit {
        if (peak_hz - self.carriers.space).abs() < (peak_hz - self.carriers.mark).abs() {
            Bit::Zero
        } else {
            Bit::One
        }
    }

    /// Decide a single window
    pub fn demodulate_window(&self, index: usize, window: &[i16]) -> WindowDecision {
        let spectrum = analyze(window, self.timing.sample_rate);
        let peak_hz = spectrum.peak_in_band(&self.band);

        let bit = match (peak_hz, self.empty_band_policy) {
            (Some(peak), _) => {
                log::debug!("Window {}: peak {:.2} Hz", index, peak);
                Some(self.classify(peak))
            }
            (None, EmptyBandPolicy::ZeroHz) => {
                log::debug!("Window {}: no in-band bin, assuming 0 Hz", index);
                Some(self.classify(0.0))
            }
            (None, EmptyBandPolicy::Erase) => {
                log::debug!("Window {}: no in-band bin, erased", index);
                None
            }
        };

        WindowDecision {
            index,
            len: window.len(),
            peak_hz,
            bit,
        }
    }

    /// Classify every window of `samples`.
    ///
    /// Yields `ceil(len / samples_per_symbol)` decisions. A short final
    /// window is still classified, with a warning.
    pub fn demodulate(&self, samples: &[i16]) -> DecodedSymbols {
        let window_len = self.timing.samples_per_symbol();
        let mut windows = Vec::with_capacity(samples.len().div_ceil(window_len));

        for (index, window) in samples.chunks(window_len).enumerate() {
            if window.len() < window_len {
                log::warn!(
                    "Window {} is shorter than expected ({} of {} samples)",
                    index,
                    window.len(),
                    window_len
                );
            }
            windows.push(self.demodulate_window(index, window));
        }

        DecodedSymbols {
            windows,
            samples_per_symbol: window_len,
        }
    }

    pub fn demodulate_bits(&self, samples: &[i16]) -> BitString {
        self.demodulate(samples).bits()
    }

    /// Demodulate at the waveform's own sample rate.
    ///
    /// The symbol duration is kept; only the window size and bin labels follow
    /// the recording. Fails when that rate leaves no samples per symbol.
    pub fn demodulate_waveform(&self, waveform: &Waveform) -> Result<DecodedSymbols> {
        if waveform.sample_rate == self.timing.sample_rate {
            return Ok(self.demodulate(&waveform.samples));
        }

        log::info!(
            "Recording is at {} Hz, configured {} Hz; using the recording's rate",
            waveform.sample_rate,
            self.timing.sample_rate
        );
        let timing = SymbolTiming::new(waveform.sample_rate, self.timing.symbol_duration);
        timing.validate()?;
        let demodulator = Self {
            timing,
            carriers: self.carriers,
            band: self.band,
            empty_band_policy: self.empty_band_policy,
        };
        Ok(demodulator.demodulate(&waveform.samples))
    }

    /// Read a WAV file and demodulate it.
    pub fn demodulate_file<P: AsRef<Path>>(&self, path: P) -> Result<DecodedSymbols> {
        let waveform = read_wav(path)?;
        self.demodulate_waveform(&waveform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bell_timing() -> SymbolTiming {
        SymbolTiming::from_bitrate(9600, 1200.0)
    }

    fn modem(timing: SymbolTiming, carriers: CarrierPair) -> (FskModulator, FskDemodulator) {
        let band = FrequencyBand::around(&carriers);
        (
            FskModulator::new(timing, carriers).unwrap(),
            FskDemodulator::new(timing, carriers, band).unwrap(),
        )
    }

    #[test]
    fn test_modulator_output_length() {
        let (modulator, _) = modem(bell_timing(), CarrierPair::BELL_202);
        let waveform = modulator.modulate("01000001");
        assert_eq!(waveform.len(), 8 * 8);
        assert_eq!(waveform.sample_rate, 9600);
        assert_eq!(modulator.output_len("01000001"), 64);
    }

    #[test]
    fn test_invalid_symbols_are_skipped() {
        let (modulator, _) = modem(bell_timing(), CarrierPair::BELL_202);
        let with_junk = modulator.modulate("01x0 2");
        let clean = modulator.modulate("010");
        assert_eq!(with_junk.len(), 3 * 8);
        assert_eq!(with_junk, clean);
        assert_eq!(modulator.output_len("01x0 2"), 24);
    }

    #[test]
    fn test_each_symbol_starts_at_zero_phase() {
        let (modulator, _) = modem(SymbolTiming::new(8000, 0.01), CarrierPair::LEGACY);
        let waveform = modulator.modulate("0110");
        for symbol in 0..4 {
            assert_eq!(waveform.samples[symbol * 80], 0);
        }
    }

    #[test]
    fn test_samples_are_clipped() {
        let (modulator, _) = modem(SymbolTiming::new(8000, 0.01), CarrierPair::LEGACY);
        let loud = modulator.with_amplitude(100_000.0).modulate("01");
        assert!(loud.samples.iter().all(|&s| (-32767..=32767).contains(&s)));
        assert!(loud.samples.iter().any(|&s| s == 32767));
    }

    #[test]
    fn test_modulator_rejects_zero_length_symbols() {
        let timing = SymbolTiming::from_bitrate(1000, 5000.0);
        assert!(FskModulator::new(timing, CarrierPair::BELL_202).is_err());
        let band = FrequencyBand::BELL_202;
        assert!(FskDemodulator::new(timing, CarrierPair::BELL_202, band).is_err());
    }

    #[test]
    fn test_demodulator_rejects_band_missing_carriers() {
        let timing = SymbolTiming::new(8000, 0.01);
        let result = FskDemodulator::new(timing, CarrierPair::LEGACY, FrequencyBand::BELL_202);
        assert!(matches!(
            result,
            Err(crate::error::ModemError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_classify_nearest_carrier() {
        let (_, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        assert_eq!(demodulator.classify(1200.0), Bit::Zero);
        assert_eq!(demodulator.classify(1600.0), Bit::Zero);
        assert_eq!(demodulator.classify(1800.0), Bit::One);
        assert_eq!(demodulator.classify(2400.0), Bit::One);
        // Exactly halfway goes to mark
        assert_eq!(demodulator.classify(1700.0), Bit::One);
        assert_eq!(demodulator.classify(0.0), Bit::Zero);
    }

    #[test]
    fn test_letter_a_round_trip() {
        let (modulator, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let waveform = modulator.modulate("01000001");
        let bits = demodulator.demodulate_bits(&waveform.samples);
        assert_eq!(bits.as_str(), "01000001");
    }

    #[test]
    fn test_legacy_pair_round_trip() {
        let (modulator, demodulator) = modem(SymbolTiming::new(8000, 0.01), CarrierPair::LEGACY);
        let bits = "0110100001101001";
        let waveform = modulator.modulate(bits);
        assert_eq!(demodulator.demodulate_bits(&waveform.samples).as_str(), bits);
    }

    #[test]
    fn test_window_count_with_short_tail() {
        let (modulator, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let mut samples = modulator.modulate("0101").samples;
        samples.extend_from_slice(&[0, 1000, -1000]);

        let decoded = demodulator.demodulate(&samples);
        assert_eq!(decoded.len(), 5);
        assert!(decoded.has_short_final_window());
        assert_eq!(decoded.windows[4].len, 3);
        assert_eq!(&decoded.bits().as_str()[..4], "0101");
    }

    #[test]
    fn test_no_short_window_on_exact_multiple() {
        let (modulator, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let waveform = modulator.modulate("0101");
        let decoded = demodulator.demodulate_waveform(&waveform).unwrap();
        assert_eq!(decoded.len(), 4);
        assert!(!decoded.has_short_final_window());
        assert_eq!(decoded.empty_band_count(), 0);
    }

    #[test]
    fn test_waveform_rate_overrides_configured_rate() {
        // Recorded at 9600 Hz, demodulator configured for 44100 Hz
        let (modulator, _) = modem(bell_timing(), CarrierPair::BELL_202);
        let (_, demodulator) = modem(
            SymbolTiming::from_bitrate(44100, 1200.0),
            CarrierPair::BELL_202,
        );
        let waveform = modulator.modulate("0100100001101001");

        let decoded = demodulator.demodulate_waveform(&waveform).unwrap();
        assert_eq!(decoded.samples_per_symbol, 8);
        assert_eq!(decoded.bits().as_str(), "0100100001101001");
    }

    #[test]
    fn test_waveform_rate_too_low_for_symbols() {
        let (_, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let waveform = Waveform::new(vec![0; 100], 1000);
        assert!(matches!(
            demodulator.demodulate_waveform(&waveform),
            Err(crate::error::ModemError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_input() {
        let (_, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let decoded = demodulator.demodulate(&[]);
        assert!(decoded.is_empty());
        assert!(decoded.bits().is_empty());
    }

    #[test]
    fn test_empty_band_defaults_to_zero_hz() {
        // A one-sample window gives a 2-point FFT with bins at 0 and -4800 Hz
        let (_, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let decision = demodulator.demodulate_window(0, &[1234]);
        assert_eq!(decision.peak_hz, None);
        assert_eq!(decision.bit, Some(Bit::Zero));
        assert_eq!(decision.symbol(), '0');
    }

    #[test]
    fn test_empty_band_zero_hz_follows_carrier_order() {
        // With the mark below the space, 0 Hz is nearer the mark
        let timing = bell_timing();
        let carriers = CarrierPair::new(2200.0, 1200.0);
        let demodulator = FskDemodulator::new(timing, carriers, FrequencyBand::BELL_202).unwrap();
        assert_eq!(demodulator.demodulate_window(0, &[1234]).bit, Some(Bit::One));
    }

    #[test]
    fn test_empty_band_erase_policy() {
        let (_, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let demodulator = demodulator.with_empty_band_policy(EmptyBandPolicy::Erase);
        let decision = demodulator.demodulate_window(3, &[1234]);
        assert_eq!(decision.index, 3);
        assert_eq!(decision.bit, None);
        assert_eq!(decision.symbol(), ERASED_SYMBOL);
    }

    #[test]
    fn test_erased_tail_is_counted() {
        let (modulator, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let demodulator = demodulator.with_empty_band_policy(EmptyBandPolicy::Erase);
        let mut samples = modulator.modulate("11").samples;
        samples.push(500);

        let decoded = demodulator.demodulate(&samples);
        assert_eq!(decoded.bits().as_str(), "11?");
        assert_eq!(decoded.erased_count(), 1);
        assert_eq!(decoded.empty_band_count(), 1);
    }

    #[test]
    fn test_demodulate_missing_file() {
        let (_, demodulator) = modem(bell_timing(), CarrierPair::BELL_202);
        let result = demodulator.demodulate_file("/nonexistent/fskwave/input.wav");
        assert!(matches!(
            result,
            Err(crate::error::ModemError::ResourceNotFound(_))
        ));
    }
}
