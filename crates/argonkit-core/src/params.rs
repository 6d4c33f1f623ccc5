//! Argon2 identity and cost parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Argon2 hash types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    /// Data-dependent hashing
    Argon2d,
    /// Data-independent hashing
    Argon2i,
    /// Mixed-mode hashing
    Argon2id,
}

impl Type {
    /// The type as it appears in an encoded hash (e.g. `argon2id`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Argon2d => "argon2d",
            Type::Argon2i => "argon2i",
            Type::Argon2id => "argon2id",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Type {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "argon2d" => Ok(Type::Argon2d),
            "argon2i" => Ok(Type::Argon2i),
            "argon2id" => Ok(Type::Argon2id),
            other => Err(Error::Format(format!("unknown Argon2 type '{}'", other))),
        }
    }
}

/// Argon2 versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Version {
    /// Version 1.0 (0x10)
    V10,
    /// Version 1.3 (0x13)
    V13,
}

impl Version {
    /// Numeric value as it appears in an encoded hash.
    pub fn value(&self) -> u32 {
        match self {
            Version::V10 => 0x10,
            Version::V13 => 0x13,
        }
    }
}

impl From<Version> for u32 {
    fn from(version: Version) -> Self {
        version.value()
    }
}

impl TryFrom<u32> for Version {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0x10 => Ok(Version::V10),
            0x13 => Ok(Version::V13),
            other => Err(Error::Format(format!("unknown Argon2 version {}", other))),
        }
    }
}

/// Identity and cost parameters for one Argon2 computation.
///
/// `threads` may exceed `lanes`; multi-threaded backends cap their workers
/// to `lanes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    pub kind: Type,
    pub version: Version,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of passes over memory
    pub time_cost: u32,
    pub lanes: u32,
    pub threads: u32,
    /// Output length in bytes
    pub hash_length: u32,
}

impl Argon2Params {
    /// Parameters using the same value for lanes and threads.
    pub fn new(
        kind: Type,
        version: Version,
        memory_cost: u32,
        time_cost: u32,
        parallelism: u32,
        hash_length: u32,
    ) -> Self {
        Self {
            kind,
            version,
            memory_cost,
            time_cost,
            lanes: parallelism,
            threads: parallelism,
            hash_length,
        }
    }

    /// Same parameters with an independent thread count.
    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// Number of workers a backend should actually use.
    pub fn effective_threads(&self) -> u32 {
        self.threads.min(self.lanes)
    }
}
