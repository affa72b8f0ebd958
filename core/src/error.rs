use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("File not found: {}", .0.display())]
    ResourceNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Noise level {0} is out of range (0-{max})", max = crate::noise::NoiseLevel::MAX)]
    InvalidNoiseLevel(u8),

    #[error("Unsupported WAV format: {0}")]
    UnsupportedFormat(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModemError>;
