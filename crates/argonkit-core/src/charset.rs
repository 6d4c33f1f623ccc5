//! Character encodings and Unicode normalization for text material.
//!
//! Conversion never fails on unmappable characters: they are replaced with
//! `?`, mirroring the replace-on-error behaviour of common text codecs.

use std::fmt;
use std::str::FromStr;

use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroize;

use crate::error::{Error, Result};

/// Byte written in place of characters the charset cannot represent.
const REPLACEMENT: u8 = b'?';

/// Supported character encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    Utf16Be,
    Utf16Le,
    Iso8859_1,
    UsAscii,
}

impl Charset {
    /// Canonical name of the charset.
    pub fn name(&self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Utf16Be => "UTF-16BE",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::UsAscii => "US-ASCII",
        }
    }

    fn max_bytes_per_char(&self) -> usize {
        match self {
            Charset::Utf8 | Charset::Utf16Be | Charset::Utf16Le => 4,
            Charset::Iso8859_1 | Charset::UsAscii => 1,
        }
    }

    /// Write one character into `out`, returning the number of bytes written.
    fn encode_char(&self, c: char, out: &mut [u8]) -> usize {
        match self {
            Charset::Utf8 => c.encode_utf8(out).len(),
            Charset::Utf16Be | Charset::Utf16Le => {
                let mut units = [0u16; 2];
                let units = c.encode_utf16(&mut units);
                let mut written = 0;
                for unit in units.iter() {
                    let bytes = match self {
                        Charset::Utf16Be => unit.to_be_bytes(),
                        _ => unit.to_le_bytes(),
                    };
                    out[written..written + 2].copy_from_slice(&bytes);
                    written += 2;
                }
                written
            }
            Charset::Iso8859_1 => {
                out[0] = u8::try_from(u32::from(c)).unwrap_or(REPLACEMENT);
                1
            }
            Charset::UsAscii => {
                out[0] = if c.is_ascii() { c as u8 } else { REPLACEMENT };
                1
            }
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Charset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let label = s.trim().to_ascii_uppercase().replace('_', "-");
        match label.as_str() {
            "UTF-8" | "UTF8" => Ok(Charset::Utf8),
            "UTF-16BE" | "UTF16BE" => Ok(Charset::Utf16Be),
            "UTF-16LE" | "UTF16LE" => Ok(Charset::Utf16Le),
            "ISO-8859-1" | "ISO8859-1" | "LATIN1" | "LATIN-1" => Ok(Charset::Iso8859_1),
            "US-ASCII" | "ASCII" => Ok(Charset::UsAscii),
            _ => Err(Error::Encoding(format!("Unsupported charset '{}'", s))),
        }
    }
}

/// Unicode normalization forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    #[default]
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl Normalization {
    fn apply(&self, chars: &[char]) -> Vec<char> {
        let source = chars.iter().copied();
        match self {
            Normalization::Nfc => source.nfc().collect(),
            Normalization::Nfd => source.nfd().collect(),
            Normalization::Nfkc => source.nfkc().collect(),
            Normalization::Nfkd => source.nfkd().collect(),
        }
    }
}

/// Convert characters to bytes, normalizing first when requested.
///
/// Every intermediate buffer holding converted material is wiped before
/// returning, including on error.
pub(crate) fn to_bytes(
    chars: &[char],
    charset: Charset,
    normalization: Option<Normalization>,
) -> Result<Vec<u8>> {
    match normalization {
        Some(form) => {
            let mut normalized = form.apply(chars);
            let encoded = encode(&normalized, charset);
            normalized.zeroize();
            encoded
        }
        None => encode(chars, charset),
    }
}

fn encode(chars: &[char], charset: Charset) -> Result<Vec<u8>> {
    let capacity = chars
        .len()
        .checked_mul(charset.max_bytes_per_char())
        .ok_or_else(|| Error::Encoding(format!("Value too large to encode to {}", charset)))?;
    let mut scratch = vec![0u8; capacity];
    let mut position = 0;
    for &c in chars {
        if scratch.len() - position < charset.max_bytes_per_char() {
            scratch.zeroize();
            return Err(Error::Encoding(format!(
                "Failed to encode value to {}",
                charset
            )));
        }
        position += charset.encode_char(c, &mut scratch[position..]);
    }

    if position == scratch.len() {
        return Ok(scratch);
    }
    let output = scratch[..position].to_vec();
    scratch.zeroize();
    Ok(output)
}

/// Decode UTF-8 bytes into characters, replacing invalid sequences with U+FFFD.
pub(crate) fn decode_utf8_lossy(bytes: &[u8]) -> Vec<char> {
    let mut chars = Vec::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        chars.extend(chunk.valid().chars());
        if !chunk.invalid().is_empty() {
            chars.push(char::REPLACEMENT_CHARACTER);
        }
    }
    chars
}
