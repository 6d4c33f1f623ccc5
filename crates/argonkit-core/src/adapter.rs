//! Direct access to the backend contract.
//!
//! [`LowLevelApi`] forwards calls to an [`Argon2Backend`] in two shapes:
//!
//! - **abbreviated**: one parallelism value used for both lanes and threads,
//!   no secret, no associated data, empty options
//! - **full** (`*_with`): independent lanes and threads plus a [`HashInput`]
//!   carrying the optional secret, associated data and options
//!
//! Both shapes reach the same backend operation. No buffer is retained or
//! modified.

use crate::backend::{Argon2Backend, HashInput, Options};
use crate::discovery::{self, SharedBackend};
use crate::error::Result;
use crate::params::Argon2Params;

/// Thin, stateless wrapper around one backend.
#[derive(Clone)]
pub struct LowLevelApi {
    backend: SharedBackend,
}

impl LowLevelApi {
    /// Wrap an explicit backend, bypassing discovery.
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Wrap the process-wide discovered backend.
    ///
    /// # Errors
    ///
    /// Returns `Error::Discovery` if discovery fails.
    pub fn discovered() -> Result<Self> {
        Ok(Self::new(discovery::backend()?))
    }

    /// Wrap a fresh instance of the registered backend type `name`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if the type is unknown or cannot be
    /// constructed.
    pub fn named(name: &str) -> Result<Self> {
        Ok(Self::new(discovery::instantiate(name)?))
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &dyn Argon2Backend {
        self.backend.as_ref()
    }

    /// Raw hash with `threads = lanes` and no secret, data or options.
    pub fn raw_hash(&self, params: &Argon2Params, salt: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        let options = Options::new();
        self.raw_hash_with(
            &params.with_threads(params.lanes),
            salt,
            &HashInput::password(password, &options),
        )
    }

    /// Raw hash with every parameter explicit.
    pub fn raw_hash_with(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<Vec<u8>> {
        Ok(self.backend.raw_hash(params, salt, input)?)
    }

    /// Encoded hash with `threads = lanes` and no secret, data or options.
    pub fn encoded_hash(&self, params: &Argon2Params, salt: &[u8], password: &[u8]) -> Result<String> {
        let options = Options::new();
        self.encoded_hash_with(
            &params.with_threads(params.lanes),
            salt,
            &HashInput::password(password, &options),
        )
    }

    /// Encoded hash with every parameter explicit.
    pub fn encoded_hash_with(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<String> {
        Ok(self.backend.encoded_hash(params, salt, input)?)
    }

    /// Verify a raw hash with `threads = lanes` and no secret, data or options.
    ///
    /// `params.hash_length` is replaced by the length of `raw_hash`.
    pub fn verify_raw(
        &self,
        params: &Argon2Params,
        raw_hash: &[u8],
        salt: &[u8],
        password: &[u8],
    ) -> Result<bool> {
        let options = Options::new();
        self.verify_raw_with(
            &params.with_threads(params.lanes),
            raw_hash,
            salt,
            &HashInput::password(password, &options),
        )
    }

    /// Verify a raw hash with every parameter explicit.
    ///
    /// `params.hash_length` is replaced by the length of `raw_hash`.
    pub fn verify_raw_with(
        &self,
        params: &Argon2Params,
        raw_hash: &[u8],
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<bool> {
        let mut params = *params;
        params.hash_length = u32::try_from(raw_hash.len()).unwrap_or(u32::MAX);
        Ok(self.backend.verify_raw(&params, raw_hash, salt, input)?)
    }

    /// Verify an encoded hash, taking the thread count from its `p=` field.
    pub fn verify_encoded(&self, encoded: &str, password: &[u8]) -> Result<bool> {
        let options = Options::new();
        self.verify_encoded_with(encoded, None, &HashInput::password(password, &options))
    }

    /// Verify an encoded hash with every parameter explicit.
    ///
    /// `threads` of `None` derives the thread count from the encoded string.
    pub fn verify_encoded_with(
        &self,
        encoded: &str,
        threads: Option<u32>,
        input: &HashInput<'_>,
    ) -> Result<bool> {
        Ok(self.backend.verify_encoded(encoded, threads, input)?)
    }
}

impl std::fmt::Debug for LowLevelApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LowLevelApi")
            .field("backend", &self.backend.name())
            .finish()
    }
}
