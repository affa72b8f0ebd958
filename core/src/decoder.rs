use crate::codec::{
    bits_to_bytes, bits_to_text, bytes_to_bits, count_bit_errors, BitString, TextDecodeError,
};
use crate::config::ModemConfig;
use crate::error::Result;
use crate::fsk::{DecodedSymbols, FskDemodulator};
use crate::wav::{read_wav, Waveform};
use std::path::Path;

/// Decoder using two-tone FSK
///
/// Classifies every symbol window of a recording and packs the bits back into
/// bytes. There is no synchronisation: the recording must start on a symbol
/// boundary.
pub struct Decoder {
    fsk: FskDemodulator,
}

/// Result of decoding one recording
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub symbols: DecodedSymbols,
    pub bits: BitString,
    pub bytes: Vec<u8>,
}

impl Decoded {
    pub fn text(&self) -> std::result::Result<String, TextDecodeError> {
        bits_to_text(self.bits.as_str())
    }
}

impl Decoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let fsk = FskDemodulator::new(config.timing(), config.carriers, config.band)?
            .with_empty_band_policy(config.empty_band_policy);
        Ok(Self { fsk })
    }

    pub fn demodulator(&self) -> &FskDemodulator {
        &self.fsk
    }

    /// Decode audio samples back to binary data.
    ///
    /// Windows follow the waveform's sample rate, which may differ from the
    /// configured one.
    pub fn decode(&self, waveform: &Waveform) -> Result<Decoded> {
        let symbols = self.fsk.demodulate_waveform(waveform)?;
        let bits = symbols.bits();
        let bytes = bits_to_bytes(bits.as_str());

        if symbols.empty_band_count() > 0 {
            log::warn!(
                "{} of {} windows had no energy in the carrier band",
                symbols.empty_band_count(),
                symbols.len()
            );
        }
        log::debug!("Decoded {} symbols into {} bytes", symbols.len(), bytes.len());

        Ok(Decoded {
            symbols,
            bits,
            bytes,
        })
    }

    /// Decode a WAV file; a missing or unreadable file is a hard failure
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<Decoded> {
        let waveform = read_wav(path)?;
        self.decode(&waveform)
    }
}

/// Original payload versus recovered payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub original_len: usize,
    pub recovered_len: usize,
    pub bit_errors: usize,
    pub matches: bool,
}

impl Comparison {
    pub fn new(original: &[u8], recovered: &[u8]) -> Self {
        let expected = bytes_to_bits(original);
        let actual = bytes_to_bits(recovered);
        Self {
            original_len: original.len(),
            recovered_len: recovered.len(),
            bit_errors: count_bit_errors(expected.as_str(), actual.as_str()),
            matches: original == recovered,
        }
    }

    /// Bit errors per original bit
    pub fn bit_error_rate(&self) -> f64 {
        let total = self.original_len * 8;
        if total == 0 {
            return if self.bit_errors == 0 { 0.0 } else { 1.0 };
        }
        self.bit_errors as f64 / total as f64
    }
}
