//! Encoded hash wire format.
//!
//! ```text
//! $argon2<type>[$v=<version>]$m=<memory>,t=<time>,p=<lanes>$<salt>$<hash>
//! ```
//!
//! The version segment is omitted for version 0x10. Salt and hash are
//! unpadded standard base64 (`[A-Za-z0-9+/]`). This module is the single
//! owner of the format: the encoder, the structural matcher used by
//! `Hasher::properties_match` and the decoder used by backends all live here.

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use regex::Regex;

use crate::error::{Error, Result};
use crate::params::{Argon2Params, Type, Version};

/// Encode parameters, salt and hash into the canonical string.
pub fn encode(params: &Argon2Params, salt: &[u8], hash: &[u8]) -> String {
    let mut encoded = format!("${}", params.kind);
    if params.version != Version::V10 {
        encoded.push_str(&format!("$v={}", params.version.value()));
    }
    encoded.push_str(&format!(
        "$m={},t={},p={}${}${}",
        params.memory_cost,
        params.time_cost,
        params.lanes,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(hash)
    ));
    encoded
}

/// Number of unpadded base64 characters needed for `bytes` bytes.
pub fn base64_length(bytes: usize) -> usize {
    let full = bytes / 3 * 4;
    match bytes % 3 {
        0 => full,
        1 => full + 2,
        _ => full + 3,
    }
}

/// Structural matcher for encoded hashes produced by one configuration.
///
/// It checks shape only: literal type, version and cost tokens plus base64
/// segments of exactly the expected lengths. It says nothing about whether
/// the hash verifies.
#[derive(Debug, Clone)]
pub struct EncodedPattern {
    regex: Regex,
}

impl EncodedPattern {
    /// Whether `encoded` has exactly the expected shape.
    pub fn matches(&self, encoded: &str) -> bool {
        self.regex.is_match(encoded)
    }

    /// The anchored expression used for matching.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Build the matcher for `params` with the given salt and hash byte lengths.
///
/// # Errors
///
/// Returns `Error::Configuration` if the expression cannot be compiled.
pub fn match_pattern(params: &Argon2Params, salt_len: usize, hash_len: usize) -> Result<EncodedPattern> {
    let version = match params.version {
        Version::V10 => String::new(),
        other => format!(r"\$v={}", other.value()),
    };
    let expression = format!(
        r"^\${kind}{version}\$m={memory},t={time},p={lanes}\$[A-Za-z0-9+/]{{{salt}}}\$[A-Za-z0-9+/]{{{hash}}}$",
        kind = params.kind,
        version = version,
        memory = params.memory_cost,
        time = params.time_cost,
        lanes = params.lanes,
        salt = base64_length(salt_len),
        hash = base64_length(hash_len),
    );
    let regex = Regex::new(&expression)
        .map_err(|e| Error::Configuration(format!("Invalid encoded hash pattern: {}", e)))?;
    Ok(EncodedPattern { regex })
}

/// Parts of a decoded hash string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHash {
    /// Parameters embedded in the string; `threads` equals `lanes` and
    /// `hash_length` equals the decoded hash length.
    pub params: Argon2Params,
    pub salt: Vec<u8>,
    pub hash: Vec<u8>,
}

/// Parse an encoded hash string.
///
/// # Errors
///
/// Returns `Error::Format` naming the offending segment if the string does
/// not follow the wire format.
pub fn decode(encoded: &str) -> Result<DecodedHash> {
    let mut segments = encoded.split('$');
    if segments.next() != Some("") {
        return Err(malformed("must start with '$'"));
    }

    let kind = segments
        .next()
        .ok_or_else(|| malformed("missing type"))?
        .parse::<Type>()?;

    let mut next = segments.next().ok_or_else(|| malformed("missing parameters"))?;
    let version = match next.strip_prefix("v=") {
        Some(value) => {
            let number = value
                .parse::<u32>()
                .map_err(|_| malformed("invalid version"))?;
            next = segments.next().ok_or_else(|| malformed("missing parameters"))?;
            Version::try_from(number)?
        }
        None => Version::V10,
    };

    let (memory_cost, time_cost, lanes) = parse_costs(next)?;

    let salt = decode_segment(segments.next(), "salt")?;
    let hash = decode_segment(segments.next(), "hash")?;
    if segments.next().is_some() {
        return Err(malformed("unexpected trailing segment"));
    }

    let hash_length = u32::try_from(hash.len()).map_err(|_| malformed("hash too long"))?;
    Ok(DecodedHash {
        params: Argon2Params::new(kind, version, memory_cost, time_cost, lanes, hash_length),
        salt,
        hash,
    })
}

fn parse_costs(segment: &str) -> Result<(u32, u32, u32)> {
    let mut fields = segment.split(',');
    let mut cost = |name: &str| -> Result<u32> {
        fields
            .next()
            .and_then(|field| field.strip_prefix(name))
            .and_then(|field| field.strip_prefix('='))
            .ok_or_else(|| malformed(&format!("missing '{}' parameter", name)))?
            .parse::<u32>()
            .map_err(|_| malformed(&format!("invalid '{}' parameter", name)))
    };
    let memory = cost("m")?;
    let time = cost("t")?;
    let lanes = cost("p")?;
    if fields.next().is_some() {
        return Err(malformed("unexpected parameter"));
    }
    Ok((memory, time, lanes))
}

fn decode_segment(segment: Option<&str>, name: &str) -> Result<Vec<u8>> {
    let segment = segment.ok_or_else(|| malformed(&format!("missing {}", name)))?;
    STANDARD_NO_PAD
        .decode(segment)
        .map_err(|e| malformed(&format!("invalid {} encoding: {}", name, e)))
}

fn malformed(reason: &str) -> Error {
    Error::Format(reason.to_string())
}
