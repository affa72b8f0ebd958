//! Modem parameters threaded explicitly through every component
//!
//! Nothing in the core reads configuration storage; callers build a
//! [`ModemConfig`] (or the individual pieces) and hand it down.

use crate::error::{ModemError, Result};
use crate::noise::NoiseLevel;
use crate::{DEFAULT_BITRATE, DEFAULT_SAMPLE_RATE};

/// The two tones of the modem: `space` carries symbol `0`, `mark` carries `1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarrierPair {
    pub space: f64,
    pub mark: f64,
}

impl CarrierPair {
    /// 440 Hz / 880 Hz pair used by the first generation of the tool
    pub const LEGACY: CarrierPair = CarrierPair {
        space: 440.0,
        mark: 880.0,
    };

    /// Bell 202 style pair, `0` at 1200 Hz and `1` at 2200 Hz
    pub const BELL_202: CarrierPair = CarrierPair {
        space: 1200.0,
        mark: 2200.0,
    };

    pub fn new(space: f64, mark: f64) -> Self {
        Self { space, mark }
    }

    /// Carrier frequency for a symbol character, `None` outside `{0,1}`.
    pub fn frequency_for(&self, symbol: char) -> Option<f64> {
        match symbol {
            '0' => Some(self.space),
            '1' => Some(self.mark),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, freq) in [("space", self.space), ("mark", self.mark)] {
            if !freq.is_finite() || freq <= 0.0 {
                return Err(ModemError::InvalidConfig(format!(
                    "{} carrier must be a positive frequency, got {}",
                    name, freq
                )));
            }
        }
        if self.space == self.mark {
            return Err(ModemError::InvalidConfig(format!(
                "carrier frequencies must differ, both are {} Hz",
                self.space
            )));
        }
        Ok(())
    }
}

impl Default for CarrierPair {
    fn default() -> Self {
        Self::BELL_202
    }
}

/// Inclusive frequency range the demodulator searches for a peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub low: f64,
    pub high: f64,
}

impl FrequencyBand {
    pub const LEGACY: FrequencyBand = FrequencyBand {
        low: 300.0,
        high: 1000.0,
    };

    pub const BELL_202: FrequencyBand = FrequencyBand {
        low: 1000.0,
        high: 2500.0,
    };

    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Band that brackets a carrier pair.
    ///
    /// The two presets map to their historical bands; any other pair gets a
    /// margin of a third of the carrier spacing on each side, floored at 0 Hz.
    pub fn around(carriers: &CarrierPair) -> Self {
        if *carriers == CarrierPair::LEGACY {
            return Self::LEGACY;
        }
        if *carriers == CarrierPair::BELL_202 {
            return Self::BELL_202;
        }
        let lo = carriers.space.min(carriers.mark);
        let hi = carriers.space.max(carriers.mark);
        let margin = (hi - lo) / 3.0;
        Self {
            low: (lo - margin).max(0.0),
            high: hi + margin,
        }
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low && freq <= self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low < 0.0 || self.low > self.high
        {
            return Err(ModemError::InvalidConfig(format!(
                "invalid frequency band {}-{} Hz",
                self.low, self.high
            )));
        }
        Ok(())
    }

    /// Both carriers must fall inside the band, or every peak is off-carrier.
    pub fn check_brackets(&self, carriers: &CarrierPair) -> Result<()> {
        if !self.contains(carriers.space) || !self.contains(carriers.mark) {
            return Err(ModemError::InvalidConfig(format!(
                "band {}-{} Hz does not contain carriers {} Hz / {} Hz",
                self.low, self.high, carriers.space, carriers.mark
            )));
        }
        Ok(())
    }
}

impl Default for FrequencyBand {
    fn default() -> Self {
        Self::BELL_202
    }
}

/// Sample rate plus symbol duration; together they fix the window size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolTiming {
    pub sample_rate: u32,
    pub symbol_duration: f64,
}

impl SymbolTiming {
    pub fn new(sample_rate: u32, symbol_duration: f64) -> Self {
        Self {
            sample_rate,
            symbol_duration,
        }
    }

    /// `symbol_duration = 1 / bitrate`
    pub fn from_bitrate(sample_rate: u32, bitrate: f64) -> Self {
        Self::new(sample_rate, 1.0 / bitrate)
    }

    /// `floor(sample_rate * symbol_duration)`
    pub fn samples_per_symbol(&self) -> usize {
        let samples = (self.sample_rate as f64 * self.symbol_duration).floor();
        if samples.is_finite() && samples > 0.0 {
            samples as usize
        } else {
            0
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ModemError::InvalidConfig(
                "sample rate must be positive".to_string(),
            ));
        }
        if self.samples_per_symbol() == 0 {
            return Err(ModemError::InvalidConfig(format!(
                "symbol duration {} s at {} Hz gives no samples per symbol",
                self.symbol_duration, self.sample_rate
            )));
        }
        Ok(())
    }
}

/// What the demodulator does with a window that has no bin inside the band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyBandPolicy {
    /// Treat the peak as 0 Hz and classify it like any other frequency.
    #[default]
    ZeroHz,
    /// Leave the window unclassified.
    Erase,
}

/// Full set of modem parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ModemConfig {
    pub sample_rate: u32,
    /// Symbols per second
    pub bitrate: f64,
    pub noise_level: NoiseLevel,
    pub carriers: CarrierPair,
    pub band: FrequencyBand,
    pub empty_band_policy: EmptyBandPolicy,
}

impl ModemConfig {
    pub fn timing(&self) -> SymbolTiming {
        SymbolTiming::from_bitrate(self.sample_rate, self.bitrate)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.bitrate.is_finite() || self.bitrate <= 0.0 {
            return Err(ModemError::InvalidConfig(format!(
                "bitrate must be positive, got {}",
                self.bitrate
            )));
        }
        self.timing().validate()?;
        self.carriers.validate()?;
        self.band.validate()?;
        self.band.check_brackets(&self.carriers)
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bitrate: DEFAULT_BITRATE,
            noise_level: NoiseLevel::NONE,
            carriers: CarrierPair::BELL_202,
            band: FrequencyBand::BELL_202,
            empty_band_policy: EmptyBandPolicy::ZeroHz,
        }
    }
}
