//! Hash request builder.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use zeroize::Zeroizing;

use crate::config::{config_mutators, HashConfig};
use crate::encoded::{self, EncodedPattern};
use crate::error::{BackendError, Error, Result};
use crate::salt::{OsSaltGenerator, SaltGenerator};

/// Immutable builder for raw and encoded hashes.
///
/// Every mutator returns a new `Hasher` and leaves the receiver unchanged, so
/// a configured hasher can be shared between threads and reused as a
/// template.
///
/// Defaults: Argon2i, version 0x13, 3 passes, 4096 KiB, one lane and one
/// thread, 32 byte hashes and 16 byte generated salts.
///
/// # Examples
///
/// ```no_run
/// use argonkit_core::{Hasher, Type};
///
/// let encoded = Hasher::new()
///     .kind(Type::Argon2id)
///     .memory_cost(65536)
///     .parallelism(4)
///     .password("correct horse")?
///     .encoded_hash()?;
/// # Ok::<(), argonkit_core::Error>(())
/// ```
#[derive(Clone)]
pub struct Hasher {
    config: HashConfig,
    salt_length: u32,
    salt_generator: Arc<dyn SaltGenerator>,
    pattern: OnceCell<EncodedPattern>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self {
            config: HashConfig::default(),
            salt_length: 16,
            salt_generator: Arc::new(OsSaltGenerator),
            pattern: OnceCell::new(),
        }
    }
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(&self, f: impl FnOnce(&mut HashConfig)) -> Self {
        let mut config = self.config.clone();
        f(&mut config);
        Self {
            config,
            salt_length: self.salt_length,
            salt_generator: self.salt_generator.clone(),
            pattern: OnceCell::new(),
        }
    }

    config_mutators!();

    /// Use `parallelism` for both lanes and threads.
    #[must_use]
    pub fn parallelism(&self, parallelism: u32) -> Self {
        self.with(|config| {
            config.params.lanes = parallelism;
            config.params.threads = parallelism;
        })
    }

    /// Set lanes and threads independently; threads above lanes are capped
    /// by the backend.
    #[must_use]
    pub fn parallelism_split(&self, lanes: u32, threads: u32) -> Self {
        self.with(|config| {
            config.params.lanes = lanes;
            config.params.threads = threads;
        })
    }

    /// Output length in bytes.
    #[must_use]
    pub fn hash_length(&self, hash_length: u32) -> Self {
        self.with(|config| config.params.hash_length = hash_length)
    }

    /// Length of salts generated by [`encoded_hash`](Self::encoded_hash).
    #[must_use]
    pub fn salt_length(&self, salt_length: u32) -> Self {
        let mut next = self.with(|_| {});
        next.salt_length = salt_length;
        next
    }

    /// Replace the salt generator.
    #[must_use]
    pub fn salt_generator(&self, generator: Arc<dyn SaltGenerator>) -> Self {
        let mut next = self.with(|_| {});
        next.salt_generator = generator;
        next
    }

    /// Compute a raw hash.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if no salt or password was set, and
    /// propagates discovery and backend errors.
    pub fn raw_hash(&self) -> Result<Vec<u8>> {
        let salt = self
            .config
            .salt()
            .ok_or_else(|| Error::Configuration("missing salt for raw hashing".to_string()))?;
        let input = self.config.input()?;
        let hash = self
            .config
            .api()?
            .raw_hash_with(&self.config.params, salt, &input)?;

        if hash.len() != self.config.params.hash_length as usize {
            return Err(BackendError::new(format!(
                "Backend returned {} hash bytes, expected {}",
                hash.len(),
                self.config.params.hash_length
            ))
            .into());
        }
        Ok(hash)
    }

    /// Compute an encoded hash.
    ///
    /// Without an explicit salt, every call draws a fresh salt of
    /// `salt_length` bytes. The generated salt is not kept, so repeated calls
    /// on the same hasher give different strings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if no password was set or salt
    /// generation fails, and propagates discovery and backend errors.
    pub fn encoded_hash(&self) -> Result<String> {
        let input = self.config.input()?;
        let api = self.config.api()?;
        match self.config.salt() {
            Some(salt) => api.encoded_hash_with(&self.config.params, salt, &input),
            None => {
                let mut salt = Zeroizing::new(vec![0u8; self.salt_length as usize]);
                self.salt_generator.generate(&mut salt)?;
                api.encoded_hash_with(&self.config.params, &salt, &input)
            }
        }
    }

    /// Whether `encoded` has the shape this hasher would produce.
    ///
    /// Type, version and costs must match literally and the salt and hash
    /// segments must have exactly the lengths of `salt_length` and
    /// `hash_length`, even when an explicit salt was set. The hash itself is
    /// not checked; use a [`Verifier`](crate::Verifier) for that.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the matcher cannot be built.
    pub fn properties_match(&self, encoded: &str) -> Result<bool> {
        let pattern = self.pattern.get_or_try_init(|| {
            encoded::match_pattern(
                &self.config.params,
                self.salt_length as usize,
                self.config.params.hash_length as usize,
            )
        })?;
        Ok(pattern.matches(encoded))
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Hasher");
        self.config.debug_fields(&mut out);
        out.field("hash_length", &self.config.params.hash_length)
            .field("salt_length", &self.salt_length)
            .finish()
    }
}
