//! Verification request builder.
//!
//! A [`Verifier`] starts without a hash. Attaching one selects how it is
//! verified:
//!
//! - [`hash_encoded`](Verifier::hash_encoded) gives a `Verifier<EncodedHash>`,
//!   which takes type, version, costs and salt from the encoded string
//! - [`hash_raw`](Verifier::hash_raw) gives a `Verifier<RawHash>`, which
//!   recomputes with the configured parameters and salt
//!
//! Only the two attach operations change the state type. Every other
//! mutator returns the same state, and attaching a hash of the other form
//! drops the previous one.

use std::fmt;

use crate::config::{config_mutators, copy_secret, HashConfig, SecretBytes};
use crate::error::{Error, Result};
use crate::material::ByteMaterial;

use secrecy::ExposeSecret;

mod sealed {
    pub trait Sealed {}
}

/// Which hash form a [`Verifier`] carries.
pub trait HashForm: sealed::Sealed + Clone {
    #[doc(hidden)]
    fn label(&self) -> &'static str;
}

/// No hash attached yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHash;

/// An encoded hash string is attached.
#[derive(Debug, Clone)]
pub struct EncodedHash(String);

/// A raw hash is attached.
#[derive(Clone)]
pub struct RawHash(SecretBytes);

impl sealed::Sealed for NoHash {}
impl sealed::Sealed for EncodedHash {}
impl sealed::Sealed for RawHash {}

impl HashForm for NoHash {
    fn label(&self) -> &'static str {
        "none"
    }
}

impl HashForm for EncodedHash {
    fn label(&self) -> &'static str {
        "encoded"
    }
}

impl HashForm for RawHash {
    fn label(&self) -> &'static str {
        "raw"
    }
}

/// Immutable builder for password verification.
///
/// Defaults match [`Hasher`](crate::Hasher). Until
/// [`parallelism`](Self::parallelism), [`parallelism_split`](Self::parallelism_split)
/// or [`threads`](Self::threads) is called the thread count is automatic:
/// encoded verification takes it from the string's `p=` field, raw
/// verification uses the lane count.
///
/// # Examples
///
/// ```no_run
/// use argonkit_core::Verifier;
///
/// # let stored = String::new();
/// let matches = Verifier::new()
///     .hash_encoded(stored)
///     .password("correct horse")?
///     .verify()?;
/// # Ok::<(), argonkit_core::Error>(())
/// ```
#[derive(Clone)]
pub struct Verifier<H: HashForm = NoHash> {
    config: HashConfig,
    auto_threads: bool,
    hash: H,
}

impl Default for Verifier<NoHash> {
    fn default() -> Self {
        Self {
            config: HashConfig::default(),
            auto_threads: true,
            hash: NoHash,
        }
    }
}

impl Verifier<NoHash> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: HashForm> Verifier<H> {
    fn with(&self, f: impl FnOnce(&mut HashConfig)) -> Self {
        let mut next = self.clone();
        f(&mut next.config);
        next
    }

    fn with_threads(&self, f: impl FnOnce(&mut HashConfig)) -> Self {
        let mut next = self.with(f);
        next.auto_threads = false;
        next
    }

    fn attach<T: HashForm>(&self, hash: T) -> Verifier<T> {
        Verifier {
            config: self.config.clone(),
            auto_threads: self.auto_threads,
            hash,
        }
    }

    config_mutators!();

    /// Use `parallelism` for both lanes and threads.
    #[must_use]
    pub fn parallelism(&self, parallelism: u32) -> Self {
        self.with_threads(|config| {
            config.params.lanes = parallelism;
            config.params.threads = parallelism;
        })
    }

    /// Set lanes and threads independently.
    #[must_use]
    pub fn parallelism_split(&self, lanes: u32, threads: u32) -> Self {
        self.with_threads(|config| {
            config.params.lanes = lanes;
            config.params.threads = threads;
        })
    }

    /// Set the thread count without touching lanes.
    #[must_use]
    pub fn threads(&self, threads: u32) -> Self {
        self.with_threads(|config| config.params.threads = threads)
    }

    /// Set lanes while keeping the automatic thread count.
    pub(crate) fn auto_parallelism(&self, lanes: u32) -> Self {
        self.with(|config| {
            config.params.lanes = lanes;
            config.params.threads = lanes;
        })
    }

    /// Attach an encoded hash, replacing any attached hash.
    pub fn hash_encoded(&self, encoded: impl Into<String>) -> Verifier<EncodedHash> {
        self.attach(EncodedHash(encoded.into()))
    }

    /// Attach a raw hash, replacing any attached hash.
    ///
    /// # Errors
    ///
    /// Propagates materialization errors of `raw_hash`.
    pub fn hash_raw<M>(&self, raw_hash: &M) -> Result<Verifier<RawHash>>
    where
        M: ByteMaterial + ?Sized,
    {
        Ok(self.attach(RawHash(copy_secret(raw_hash)?)))
    }
}

impl Verifier<EncodedHash> {
    /// The attached encoded hash.
    pub fn encoded(&self) -> &str {
        &self.hash.0
    }

    /// Recompute from the encoded string's parameters and compare.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if no password was set, and propagates
    /// discovery and backend errors, including malformed strings.
    pub fn verify(&self) -> Result<bool> {
        let input = self.config.input()?;
        let threads = if self.auto_threads {
            None
        } else {
            Some(self.config.params.threads)
        };
        self.config
            .api()?
            .verify_encoded_with(&self.hash.0, threads, &input)
    }
}

impl Verifier<RawHash> {
    /// Recompute with the configured parameters and compare.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if no salt or password was set, and
    /// propagates discovery and backend errors.
    pub fn verify(&self) -> Result<bool> {
        let salt = self
            .config
            .salt()
            .ok_or_else(|| Error::Configuration("missing salt for raw verification".to_string()))?;
        let input = self.config.input()?;
        let params = &self.config.params;
        let threads = if self.auto_threads {
            params.lanes
        } else {
            params.threads
        };
        self.config.api()?.verify_raw_with(
            &params.with_threads(threads),
            self.hash.0.expose_secret(),
            salt,
            &input,
        )
    }
}

impl<H: HashForm> fmt::Debug for Verifier<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Verifier");
        self.config.debug_fields(&mut out);
        out.field("auto_threads", &self.auto_threads)
            .field("hash", &self.hash.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Type;

    #[test]
    fn test_defaults_use_auto_threads() {
        let verifier = Verifier::new();
        assert!(verifier.auto_threads);
        assert_eq!(verifier.config.params.kind, Type::Argon2i);
        assert_eq!(verifier.config.params.lanes, 1);
    }

    #[test]
    fn test_thread_mutators_disable_auto_threads() {
        let base = Verifier::new();
        assert!(!base.parallelism(2).auto_threads);
        assert!(!base.parallelism_split(4, 2).auto_threads);

        let threads = base.parallelism_split(4, 4).threads(1);
        assert!(!threads.auto_threads);
        assert_eq!(threads.config.params.lanes, 4);
        assert_eq!(threads.config.params.threads, 1);

        assert!(base.auto_threads);
        assert!(base.time_cost(7).auto_threads);
    }

    #[test]
    fn test_mutators_preserve_state() {
        let encoded: Verifier<EncodedHash> = Verifier::new()
            .hash_encoded("$argon2i$x")
            .memory_cost(1024)
            .parallelism(2);
        assert_eq!(encoded.encoded(), "$argon2i$x");
        assert_eq!(encoded.config.params.memory_cost, 1024);
    }

    #[test]
    fn test_attaching_other_form_replaces_hash() {
        let raw = Verifier::new()
            .hash_encoded("$argon2i$x")
            .hash_raw(&[1u8, 2, 3])
            .unwrap();
        assert_eq!(raw.hash.0.expose_secret(), &[1u8, 2, 3]);

        let encoded = raw.hash_encoded("$argon2d$y");
        assert_eq!(encoded.encoded(), "$argon2d$y");
    }

    #[test]
    fn test_attach_keeps_configuration() {
        let raw = Verifier::new()
            .threads(3)
            .salt(b"saltsalt")
            .unwrap()
            .hash_raw(&[0u8; 4])
            .unwrap();
        assert!(!raw.auto_threads);
        assert_eq!(raw.config.params.threads, 3);
        assert_eq!(raw.config.salt(), Some(&b"saltsalt"[..]));
    }

    #[test]
    fn test_raw_verify_requires_salt() {
        let err = Verifier::new()
            .password("pw")
            .unwrap()
            .hash_raw(&[0u8; 4])
            .unwrap()
            .verify()
            .unwrap_err();
        assert!(err.to_string().contains("missing salt"));
    }

    #[test]
    fn test_debug_redacts_material() {
        let verifier = Verifier::new()
            .password("hunter2hunter2")
            .unwrap()
            .hash_raw(&[0xCDu8; 8])
            .unwrap();
        let debug = format!("{:?}", verifier);
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("raw"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains(&hex::encode([0xCDu8; 8])));
    }
}
