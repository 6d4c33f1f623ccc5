//! Backend capability contract.
//!
//! The Argon2 computation itself lives outside this crate. A backend is any
//! type implementing [`Argon2Backend`]; it is reached either through discovery
//! (see [`crate::discovery`]) or by passing an instance to a builder.
//!
//! Implementations must:
//! - validate Argon2 parameter bounds themselves and report violations as
//!   [`BackendError`]
//! - accept `threads > lanes`, capping effective workers to `lanes`
//! - leave every input buffer untouched

use crate::error::BackendError;
use crate::params::Argon2Params;

/// Backend-specific options passed through unchanged.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Data inputs shared by every backend operation.
#[derive(Debug, Clone, Copy)]
pub struct HashInput<'a> {
    pub password: &'a [u8],
    pub secret: Option<&'a [u8]>,
    pub ad: Option<&'a [u8]>,
    pub options: &'a Options,
}

impl<'a> HashInput<'a> {
    /// Input with a password only and empty options.
    pub fn password(password: &'a [u8], options: &'a Options) -> Self {
        Self {
            password,
            secret: None,
            ad: None,
            options,
        }
    }
}

/// Argon2 computation service.
pub trait Argon2Backend: Send + Sync {
    /// Type name used for discovery diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Compute a raw hash of exactly `params.hash_length` bytes.
    fn raw_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<Vec<u8>, BackendError>;

    /// Compute a hash and return it in the encoded wire format.
    fn encoded_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<String, BackendError>;

    /// Recompute with `params` and compare against `raw_hash`.
    ///
    /// `params.hash_length` equals `raw_hash.len()`.
    fn verify_raw(
        &self,
        params: &Argon2Params,
        raw_hash: &[u8],
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError>;

    /// Recompute using the parameters embedded in `encoded`.
    ///
    /// `threads` of `None` means "derive from the encoded `p=` field".
    fn verify_encoded(
        &self,
        encoded: &str,
        threads: Option<u32>,
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError>;
}
