//! JSON config file layered under command-line flags

use fskwave_core::{CarrierPair, EmptyBandPolicy, FrequencyBand, ModemConfig, NoiseLevel};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Modem(#[from] fskwave_core::ModemError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CarrierPreset {
    /// 440 Hz / 880 Hz
    Legacy,
    /// 1200 Hz / 2200 Hz
    Bell202,
}

impl CarrierPreset {
    pub fn carriers(self) -> CarrierPair {
        match self {
            CarrierPreset::Legacy => CarrierPair::LEGACY,
            CarrierPreset::Bell202 => CarrierPair::BELL_202,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CarrierSpec {
    Preset(CarrierPreset),
    Custom { space: f64, mark: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BandSpec {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicySpec {
    ZeroHz,
    Erase,
}

/// On-disk configuration; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub sample_rate: Option<u32>,
    pub bitrate: Option<f64>,
    pub noise_level: Option<u8>,
    pub carriers: Option<CarrierSpec>,
    pub band: Option<BandSpec>,
    pub empty_band_policy: Option<PolicySpec>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Values given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub sample_rate: Option<u32>,
    pub bitrate: Option<f64>,
    pub noise_level: Option<u8>,
    pub carriers: Option<CarrierPreset>,
    pub erase_empty_bands: bool,
}

/// Defaults, then the file, then the flags
pub fn resolve(file: &ConfigFile, overrides: &Overrides) -> Result<ModemConfig, ConfigError> {
    let defaults = ModemConfig::default();

    let carriers = match (overrides.carriers, file.carriers) {
        (Some(preset), _) => preset.carriers(),
        (None, Some(CarrierSpec::Preset(preset))) => preset.carriers(),
        (None, Some(CarrierSpec::Custom { space, mark })) => CarrierPair::new(space, mark),
        (None, None) => defaults.carriers,
    };

    // A carrier flag replaces the file's carriers, so it also replaces its band
    let band = match (overrides.carriers, file.band) {
        (None, Some(BandSpec { low, high })) => FrequencyBand::new(low, high),
        _ => FrequencyBand::around(&carriers),
    };

    let noise_level = match overrides.noise_level.or(file.noise_level) {
        Some(level) => NoiseLevel::new(level)?,
        None => defaults.noise_level,
    };

    let empty_band_policy = if overrides.erase_empty_bands {
        EmptyBandPolicy::Erase
    } else {
        match file.empty_band_policy {
            Some(PolicySpec::Erase) => EmptyBandPolicy::Erase,
            Some(PolicySpec::ZeroHz) => EmptyBandPolicy::ZeroHz,
            None => defaults.empty_band_policy,
        }
    };

    let config = ModemConfig {
        sample_rate: overrides
            .sample_rate
            .or(file.sample_rate)
            .unwrap_or(defaults.sample_rate),
        bitrate: overrides.bitrate.or(file.bitrate).unwrap_or(defaults.bitrate),
        noise_level,
        carriers,
        band,
        empty_band_policy,
    };
    config.validate()?;
    Ok(config)
}
