//! # Argonkit RustCrypto backend
//!
//! An [`Argon2Backend`] built on the RustCrypto `argon2` crate. Linking this
//! crate registers [`RustCryptoBackend`] as a discoverable service provider,
//! so the builders in `argonkit_core` find it without further setup.
//!
//! ```no_run
//! use argonkit_core::{Hasher, Verifier};
//!
//! let encoded = Hasher::new().password("correct horse")?.encoded_hash()?;
//! assert!(Verifier::new()
//!     .hash_encoded(encoded)
//!     .password("correct horse")?
//!     .verify()?);
//! # Ok::<(), argonkit_core::Error>(())
//! ```

use argon2::{Algorithm, Argon2, AssociatedData, ParamsBuilder};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use argonkit_core::encoded;
use argonkit_core::{
    register_backend, Argon2Backend, Argon2Params, BackendError, HashInput, Type, Version,
};

/// Argon2 backend using the RustCrypto implementation.
///
/// Single-threaded: every lane is computed on the calling thread. The thread
/// count is checked to be at least 1 and otherwise has no effect, so the
/// output depends on the lane count only.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoBackend;

register_backend!(RustCryptoBackend);

impl RustCryptoBackend {
    fn compute(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<Zeroizing<Vec<u8>>, BackendError> {
        if params.threads == 0 {
            return Err(BackendError::new("Invalid threads: must be at least 1"));
        }

        let mut builder = ParamsBuilder::new();
        builder
            .m_cost(params.memory_cost)
            .t_cost(params.time_cost)
            .p_cost(params.lanes)
            .output_len(params.hash_length as usize);
        if let Some(ad) = input.ad {
            builder.data(AssociatedData::new(ad).map_err(invalid("associated data"))?);
        }
        let argon2_params = builder.build().map_err(invalid("parameters"))?;

        let algorithm = algorithm(params.kind);
        let version = version(params.version);
        let context = match input.secret {
            Some(secret) => Argon2::new_with_secret(secret, algorithm, version, argon2_params)
                .map_err(invalid("secret"))?,
            None => Argon2::new(algorithm, version, argon2_params),
        };

        tracing::debug!(
            lanes = params.lanes,
            requested_threads = params.threads,
            "computing argon2 hash on the calling thread"
        );

        let mut output = Zeroizing::new(vec![0u8; params.hash_length as usize]);
        context
            .hash_password_into(input.password, salt, &mut output)
            .map_err(invalid("hash computation"))?;
        Ok(output)
    }
}

impl Argon2Backend for RustCryptoBackend {
    fn raw_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        let hash = self.compute(params, salt, input)?;
        Ok(hash.to_vec())
    }

    fn encoded_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<String, BackendError> {
        let hash = self.compute(params, salt, input)?;
        Ok(encoded::encode(params, salt, &hash))
    }

    fn verify_raw(
        &self,
        params: &Argon2Params,
        raw_hash: &[u8],
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        let hash = self.compute(params, salt, input)?;
        Ok(hash.as_slice().ct_eq(raw_hash).into())
    }

    fn verify_encoded(
        &self,
        encoded: &str,
        threads: Option<u32>,
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        let decoded = encoded::decode(encoded)
            .map_err(|e| BackendError::new(format!("Invalid encoded hash: {}", e)))?;
        let params = match threads {
            Some(threads) => decoded.params.with_threads(threads),
            None => decoded.params,
        };
        self.verify_raw(&params, &decoded.hash, &decoded.salt, input)
    }
}

fn algorithm(kind: Type) -> Algorithm {
    match kind {
        Type::Argon2d => Algorithm::Argon2d,
        Type::Argon2i => Algorithm::Argon2i,
        Type::Argon2id => Algorithm::Argon2id,
    }
}

fn version(version: Version) -> argon2::Version {
    match version {
        Version::V10 => argon2::Version::V0x10,
        Version::V13 => argon2::Version::V0x13,
    }
}

fn invalid(what: &'static str) -> impl Fn(argon2::Error) -> BackendError {
    move |e| BackendError::new(format!("Invalid {}: {}", what, e))
}
