//! Byte ↔ bit string conversion, MSB first, 8 symbols per byte

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Value of one classified symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bit {
    Zero,
    One,
}

impl Bit {
    pub fn as_char(self) -> char {
        match self {
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }
}

/// Ordered sequence of `0`/`1` symbols.
///
/// Hand-authored strings may contain other characters; they are kept as-is
/// so the modulator can skip them and the reverse conversion can drop them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitString(String);

impl BitString {
    pub fn new() -> Self {
        Self(String::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(String::with_capacity(capacity))
    }

    pub fn push(&mut self, bit: Bit) {
        self.0.push(bit.as_char());
    }

    pub fn push_symbol(&mut self, symbol: char) {
        self.0.push(symbol);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of symbols, including any non-binary ones
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` when every symbol is `0` or `1`
    pub fn is_binary(&self) -> bool {
        self.0.chars().all(|c| c == '0' || c == '1')
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BitString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BitString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BitString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for BitString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl FromIterator<Bit> for BitString {
    fn from_iter<I: IntoIterator<Item = Bit>>(iter: I) -> Self {
        Self(iter.into_iter().map(Bit::as_char).collect())
    }
}

/// Recovered bytes were not valid UTF-8
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode failure: invalid UTF-8 at byte {} of {}", .valid_up_to, .bytes.len())]
pub struct TextDecodeError {
    /// Length of the longest valid UTF-8 prefix
    pub valid_up_to: usize,
    /// The recovered bytes, kept for diagnostics
    pub bytes: Vec<u8>,
}

impl TextDecodeError {
    /// Valid prefix plus lossy remainder, for display
    pub fn lossy_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

pub fn bytes_to_bits(bytes: &[u8]) -> BitString {
    let mut bits = String::with_capacity(bytes.len() * 8);
    for byte in bytes {
        for shift in (0..8).rev() {
            bits.push(if (byte >> shift) & 1 == 1 { '1' } else { '0' });
        }
    }
    BitString(bits)
}

pub fn text_to_bits(text: &str) -> BitString {
    bytes_to_bits(text.as_bytes())
}

/// Pack consecutive 8-symbol chunks into bytes.
///
/// A trailing chunk shorter than 8 symbols is discarded. A full chunk that
/// holds anything other than `0`/`1` is discarded too.
pub fn bits_to_bytes(bits: &str) -> Vec<u8> {
    let symbols: Vec<char> = bits.chars().collect();
    let mut bytes = Vec::with_capacity(symbols.len() / 8);

    for (chunk_idx, chunk) in symbols.chunks(8).enumerate() {
        if chunk.len() < 8 {
            log::debug!("Dropping {} trailing symbols", chunk.len());
            break;
        }

        let mut byte = 0u8;
        let mut valid = true;
        for &symbol in chunk {
            byte <<= 1;
            match symbol {
                '0' => {}
                '1' => byte |= 1,
                _ => {
                    valid = false;
                    break;
                }
            }
        }

        if valid {
            bytes.push(byte);
        } else {
            log::warn!("Dropping byte {}: chunk contains non-binary symbols", chunk_idx);
        }
    }

    bytes
}

pub fn bits_to_text(bits: &str) -> Result<String, TextDecodeError> {
    let bytes = bits_to_bytes(bits);
    String::from_utf8(bytes).map_err(|e| TextDecodeError {
        valid_up_to: e.utf8_error().valid_up_to(),
        bytes: e.into_bytes(),
    })
}

/// Mismatched symbols over the common prefix plus the length difference
pub fn count_bit_errors(expected: &str, actual: &str) -> usize {
    let mismatched = expected
        .chars()
        .zip(actual.chars())
        .filter(|(a, b)| a != b)
        .count();
    let expected_len = expected.chars().count();
    let actual_len = actual.chars().count();
    mismatched + expected_len.abs_diff(actual_len)
}
