//! Configuration shared by [`Hasher`](crate::Hasher) and
//! [`Verifier`](crate::Verifier).
//!
//! Builders own one `HashConfig` each and replace it on every mutation.
//! Sensitive inputs are copied once into `secrecy` boxes behind an `Arc`, so a
//! copy-on-write generation shares them with its parent instead of copying the
//! bytes again. The bytes are wiped when the last generation drops.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretSlice};

use crate::adapter::LowLevelApi;
use crate::backend::{HashInput, Options};
use crate::discovery::{self, SharedBackend};
use crate::error::{Error, Result};
use crate::material::ByteMaterial;
use crate::params::{Argon2Params, Type, Version};

/// Builder-owned copy of sensitive bytes.
pub(crate) type SecretBytes = Arc<SecretSlice<u8>>;

/// Copy the bytes of `material` into a secret box.
pub(crate) fn copy_secret<M>(material: &M) -> Result<SecretBytes>
where
    M: ByteMaterial + ?Sized,
{
    let bytes = material.material()?.to_vec();
    Ok(Arc::new(SecretSlice::from(bytes)))
}

#[derive(Clone)]
pub(crate) struct HashConfig {
    pub backend: Option<SharedBackend>,
    pub options: Arc<Options>,
    pub params: Argon2Params,
    pub salt: Option<SecretBytes>,
    pub password: Option<SecretBytes>,
    pub secret: Option<SecretBytes>,
    pub ad: Option<SecretBytes>,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            backend: None,
            options: Arc::new(Options::new()),
            params: Argon2Params::new(Type::Argon2i, Version::V13, 4096, 3, 1, 32),
            salt: None,
            password: None,
            secret: None,
            ad: None,
        }
    }
}

impl HashConfig {
    /// The explicit backend, or the discovered one.
    pub fn api(&self) -> Result<LowLevelApi> {
        let backend = match &self.backend {
            Some(backend) => backend.clone(),
            None => discovery::backend()?,
        };
        Ok(LowLevelApi::new(backend))
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_ref().map(|salt| salt.expose_secret())
    }

    /// Backend input view.
    ///
    /// # Errors
    ///
    /// Returns `Error::Configuration` if no password was set or the
    /// parallelism is zero.
    pub fn input(&self) -> Result<HashInput<'_>> {
        if self.params.lanes == 0 {
            return Err(Error::Configuration("lanes must be at least 1".to_string()));
        }
        if self.params.threads == 0 {
            return Err(Error::Configuration(
                "threads must be at least 1".to_string(),
            ));
        }
        let password = self
            .password
            .as_ref()
            .ok_or_else(|| Error::Configuration("missing password".to_string()))?;
        Ok(HashInput {
            password: password.expose_secret(),
            secret: self.secret.as_ref().map(|s| s.expose_secret()),
            ad: self.ad.as_ref().map(|s| s.expose_secret()),
            options: &self.options,
        })
    }

    /// Shared `Debug` fields; byte inputs only report presence.
    pub fn debug_fields(&self, out: &mut fmt::DebugStruct<'_, '_>) {
        out.field(
            "backend",
            &self.backend.as_ref().map_or("<discovered>", |b| b.name()),
        )
        .field("options", &self.options.len())
        .field("type", &self.params.kind)
        .field("version", &self.params.version)
        .field("time_cost", &self.params.time_cost)
        .field("memory_cost", &self.params.memory_cost)
        .field("lanes", &self.params.lanes)
        .field("threads", &self.params.threads)
        .field("salt", &redacted(&self.salt))
        .field("password", &redacted(&self.password))
        .field("secret", &redacted(&self.secret))
        .field("ad", &redacted(&self.ad));
    }
}

fn redacted(value: &Option<SecretBytes>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Mutators common to both builders.
///
/// The builder must provide `fn with(&self, impl FnOnce(&mut HashConfig)) -> Self`.
macro_rules! config_mutators {
    () => {
        /// Use `backend` instead of the discovered one.
        #[must_use]
        pub fn backend(&self, backend: $crate::discovery::SharedBackend) -> Self {
            self.with(|config| config.backend = Some(backend))
        }

        /// Use a fresh instance of the registered backend type `name`.
        ///
        /// # Errors
        ///
        /// Returns `Error::Configuration` if the type is unknown or cannot be
        /// constructed.
        pub fn backend_named(&self, name: &str) -> $crate::error::Result<Self> {
            let backend = $crate::discovery::instantiate(name)?;
            Ok(self.with(|config| config.backend = Some(backend)))
        }

        /// Backend-specific options, replacing any previous ones.
        #[must_use]
        pub fn options(&self, options: $crate::backend::Options) -> Self {
            self.with(|config| config.options = ::std::sync::Arc::new(options))
        }

        #[must_use]
        pub fn kind(&self, kind: $crate::params::Type) -> Self {
            self.with(|config| config.params.kind = kind)
        }

        #[must_use]
        pub fn version(&self, version: $crate::params::Version) -> Self {
            self.with(|config| config.params.version = version)
        }

        /// Number of passes over memory.
        #[must_use]
        pub fn time_cost(&self, time_cost: u32) -> Self {
            self.with(|config| config.params.time_cost = time_cost)
        }

        /// Memory cost in KiB.
        #[must_use]
        pub fn memory_cost(&self, memory_cost: u32) -> Self {
            self.with(|config| config.params.memory_cost = memory_cost)
        }

        /// Copy `salt` into the builder.
        ///
        /// # Errors
        ///
        /// Propagates materialization errors of `salt`.
        pub fn salt<M>(&self, salt: &M) -> $crate::error::Result<Self>
        where
            M: $crate::material::ByteMaterial + ?Sized,
        {
            let salt = $crate::config::copy_secret(salt)?;
            Ok(self.with(|config| config.salt = Some(salt)))
        }

        /// Copy `password` into the builder.
        ///
        /// # Errors
        ///
        /// Propagates materialization errors of `password`.
        pub fn password<M>(&self, password: &M) -> $crate::error::Result<Self>
        where
            M: $crate::material::ByteMaterial + ?Sized,
        {
            let password = $crate::config::copy_secret(password)?;
            Ok(self.with(|config| config.password = Some(password)))
        }

        /// Copy the keyed-hashing `secret` into the builder.
        ///
        /// # Errors
        ///
        /// Propagates materialization errors of `secret`.
        pub fn secret<M>(&self, secret: &M) -> $crate::error::Result<Self>
        where
            M: $crate::material::ByteMaterial + ?Sized,
        {
            let secret = $crate::config::copy_secret(secret)?;
            Ok(self.with(|config| config.secret = Some(secret)))
        }

        /// Copy associated data into the builder.
        ///
        /// # Errors
        ///
        /// Propagates materialization errors of `ad`.
        pub fn ad<M>(&self, ad: &M) -> $crate::error::Result<Self>
        where
            M: $crate::material::ByteMaterial + ?Sized,
        {
            let ad = $crate::config::copy_secret(ad)?;
            Ok(self.with(|config| config.ad = Some(ad)))
        }
    };
}

pub(crate) use config_mutators;
