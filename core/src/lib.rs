//! Two-tone FSK audio modem
//!
//! Bytes become an MSB-first bit string, each bit a fixed-length pure tone.
//! The receiver slices the recording into symbol windows and picks the
//! strongest in-band frequency of each. A synthetic channel model injects
//! white noise, mains hum, impulses and in-band jamming for stress tests.

pub mod error;
pub mod config;
pub mod codec;
pub mod wav;
pub mod spectrum;
pub mod noise;
pub mod fsk;
pub mod encoder;
pub mod decoder;

pub use codec::{
    bits_to_bytes, bits_to_text, bytes_to_bits, text_to_bits, Bit, BitString, TextDecodeError,
};
pub use config::{CarrierPair, EmptyBandPolicy, FrequencyBand, ModemConfig, SymbolTiming};
pub use decoder::{Comparison, Decoded, Decoder};
pub use encoder::Encoder;
pub use error::{ModemError, Result};
pub use fsk::{DecodedSymbols, FskDemodulator, FskModulator, WindowDecision};
pub use noise::{apply_noise, ChannelNoise, NoiseLevel};
pub use wav::{read_wav, write_wav, Waveform};

// Configuration defaults
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_BITRATE: f64 = 1200.0; // symbols per second

// Sample range
pub const MAX_SAMPLE: i16 = 32767;
pub const DEFAULT_AMPLITUDE: f64 = MAX_SAMPLE as f64;
