//! File-based hashing settings.
//!
//! Settings are plain TOML; every key is optional and falls back to the
//! builder defaults:
//!
//! ```toml
//! type = "argon2id"
//! version = 19
//! memory_cost = 65536
//! time_cost = 3
//! lanes = 4
//! threads = 2
//! hash_length = 32
//! salt_length = 16
//! ```
//!
//! When `threads` is absent hashing uses one thread per lane and
//! verification keeps its automatic thread count.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hasher::Hasher;
use crate::params::{Type, Version};
use crate::verifier::Verifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Argon2Settings {
    #[serde(rename = "type")]
    pub kind: Type,
    pub version: Version,
    /// KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub lanes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    pub hash_length: u32,
    pub salt_length: u32,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            kind: Type::Argon2i,
            version: Version::V13,
            memory_cost: 4096,
            time_cost: 3,
            lanes: 1,
            threads: None,
            hash_length: 32,
            salt_length: 16,
        }
    }
}

impl Argon2Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` for invalid TOML, unknown keys or
    /// out-of-range values.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse settings: {}", e)))
    }

    /// Read settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!(
                "Failed to read settings {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Render settings as TOML.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("TOML error: {}", e)))
    }

    /// A hasher configured from these settings.
    pub fn hasher(&self) -> Hasher {
        Hasher::new()
            .kind(self.kind)
            .version(self.version)
            .memory_cost(self.memory_cost)
            .time_cost(self.time_cost)
            .parallelism_split(self.lanes, self.threads.unwrap_or(self.lanes))
            .hash_length(self.hash_length)
            .salt_length(self.salt_length)
    }

    /// A verifier configured from these settings.
    pub fn verifier(&self) -> Verifier {
        let verifier = Verifier::new()
            .kind(self.kind)
            .version(self.version)
            .memory_cost(self.memory_cost)
            .time_cost(self.time_cost);
        match self.threads {
            Some(threads) => verifier.parallelism_split(self.lanes, threads),
            None => verifier.auto_parallelism(self.lanes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = Argon2Settings::from_toml("").unwrap();
        assert_eq!(settings, Argon2Settings::default());
    }

    #[test]
    fn test_parse_full_settings() {
        let settings = Argon2Settings::from_toml(
            r#"
            type = "argon2id"
            version = 16
            memory_cost = 65536
            time_cost = 2
            lanes = 4
            threads = 2
            hash_length = 64
            salt_length = 32
            "#,
        )
        .unwrap();
        assert_eq!(settings.kind, Type::Argon2id);
        assert_eq!(settings.version, Version::V10);
        assert_eq!(settings.memory_cost, 65536);
        assert_eq!(settings.lanes, 4);
        assert_eq!(settings.threads, Some(2));
        assert_eq!(settings.salt_length, 32);
    }

    #[test]
    fn test_rejects_bad_values() {
        for bad in [
            "version = 18",
            "type = \"argon2x\"",
            "lanes = -1",
            "colour = \"blue\"",
        ] {
            let err = Argon2Settings::from_toml(bad).unwrap_err();
            assert!(err.to_string().contains("Failed to parse settings"), "{}", bad);
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = Argon2Settings {
            kind: Type::Argon2d,
            threads: Some(3),
            ..Argon2Settings::default()
        };
        let text = settings.to_toml().unwrap();
        assert!(text.contains("type = \"argon2d\""));
        assert!(text.contains("version = 19"));
        assert_eq!(Argon2Settings::from_toml(&text).unwrap(), settings);
    }

    #[test]
    fn test_read_missing_file() {
        let err = Argon2Settings::read(Path::new("/nonexistent/argonkit.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings"));
    }

    #[test]
    fn test_builders_from_settings() {
        let settings = Argon2Settings {
            kind: Type::Argon2id,
            lanes: 4,
            ..Argon2Settings::default()
        };
        let debug = format!("{:?}", settings.hasher());
        assert!(debug.contains("Argon2id"));
        assert!(debug.contains("lanes: 4"));
        assert!(debug.contains("threads: 4"));

        let debug = format!("{:?}", settings.verifier());
        assert!(debug.contains("auto_threads: true"));

        let pinned = Argon2Settings {
            threads: Some(1),
            ..settings
        };
        assert!(format!("{:?}", pinned.verifier()).contains("auto_threads: false"));
    }
}
