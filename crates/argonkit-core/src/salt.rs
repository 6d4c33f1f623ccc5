//! Salt generation.

use crate::error::{Error, Result};

/// Source of random salt bytes.
pub trait SaltGenerator: Send + Sync {
    /// Fill `salt` with random bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the randomness source fails.
    fn generate(&self, salt: &mut [u8]) -> Result<()>;
}

/// Salt generator backed by the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSaltGenerator;

impl SaltGenerator for OsSaltGenerator {
    fn generate(&self, salt: &mut [u8]) -> Result<()> {
        tracing::trace!(length = salt.len(), "generating salt");
        getrandom::getrandom(salt)
            .map_err(|e| Error::Configuration(format!("Failed to generate salt: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_requested_length() {
        let mut salt = [0u8; 32];
        OsSaltGenerator.generate(&mut salt).unwrap();
        assert!(salt.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_salts_differ() {
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        OsSaltGenerator.generate(&mut first).unwrap();
        OsSaltGenerator.generate(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_empty_salt() {
        let mut salt: [u8; 0] = [];
        assert!(OsSaltGenerator.generate(&mut salt).is_ok());
    }
}
