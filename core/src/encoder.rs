use crate::codec::{bytes_to_bits, BitString};
use crate::config::ModemConfig;
use crate::error::Result;
use crate::fsk::FskModulator;
use crate::noise::ChannelNoise;
use crate::wav::Waveform;

/// Encoder using two-tone FSK
///
/// Turns bytes into an MSB-first bit string and modulates one tone per bit.
/// The output carries no preamble, framing or error correction; the receiver
/// must use the same timing and carriers.
pub struct Encoder {
    fsk: FskModulator,
    config: ModemConfig,
}

impl Encoder {
    pub fn new(config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            fsk: FskModulator::new(config.timing(), config.carriers)?,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    pub fn modulator(&self) -> &FskModulator {
        &self.fsk
    }

    /// Encode binary data into a clean waveform
    pub fn encode(&self, data: &[u8]) -> Waveform {
        let bits = bytes_to_bits(data);
        log::debug!("Encoding {} bytes as {} symbols", data.len(), bits.len());
        self.fsk.modulate(&bits)
    }

    pub fn encode_text(&self, text: &str) -> Waveform {
        self.encode(text.as_bytes())
    }

    /// Modulate a hand-authored bit string; non-binary symbols are skipped
    pub fn encode_bits(&self, bits: &BitString) -> Waveform {
        self.fsk.modulate(bits)
    }

    /// Encode and pass the result through the configured noise level
    pub fn encode_noisy(&self, data: &[u8], seed: Option<u64>) -> Waveform {
        let clean = self.encode(data);
        if self.config.noise_level.is_none() {
            return clean;
        }
        let mut noise = match seed {
            Some(seed) => ChannelNoise::with_seed(self.config.noise_level, self.config.band, seed),
            None => ChannelNoise::new(self.config.noise_level, self.config.band),
        };
        noise.apply(&clean)
    }
}
