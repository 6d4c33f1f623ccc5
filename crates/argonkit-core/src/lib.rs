//! # Argonkit Core
//!
//! Credential hashing front end for pluggable Argon2 backends.
//!
//! This crate assembles hashing and verification requests and gives
//! sensitive byte material an explicit lifecycle. The Argon2 computation is
//! delegated to a backend implementing [`Argon2Backend`], found through
//! process-wide discovery or passed to a builder directly.
//!
//! ## Architecture
//!
//! - **material**: byte material from buffers, text and streams, with wiping
//! - **charset**: text encodings and Unicode normalization
//! - **encoded**: the `$argon2...` wire format
//! - **hasher** / **verifier**: immutable copy-on-write request builders
//! - **adapter**: the low-level API translating call shapes to the backend
//! - **discovery**: backend registration and the process-wide resolver
//! - **settings**: TOML-based builder settings
//!
//! ## Example
//!
//! ```no_run
//! use argonkit_core::material::ClearableCharSeqBytes;
//! use argonkit_core::{Hasher, Type, Verifier};
//!
//! let mut typed = String::from("correct horse");
//! let password = ClearableCharSeqBytes::from_string(&mut typed)
//!     .normalize()
//!     .clear_source(true)
//!     .scope();
//!
//! let hasher = Hasher::new().kind(Type::Argon2id).password(&*password)?;
//! let encoded = hasher.encoded_hash()?;
//!
//! assert!(Verifier::new()
//!     .hash_encoded(encoded)
//!     .password(&*password)?
//!     .verify()?);
//! # Ok::<(), argonkit_core::Error>(())
//! ```

pub mod adapter;
pub mod backend;
pub mod charset;
mod config;
pub mod discovery;
pub mod encoded;
pub mod error;
pub mod hasher;
pub mod material;
pub mod params;
pub mod salt;
pub mod settings;
pub mod verifier;

pub use adapter::LowLevelApi;
pub use backend::{Argon2Backend, HashInput, Options};
pub use charset::{Charset, Normalization};
pub use error::{BackendError, DiscoveryError, Error, Result};
pub use hasher::Hasher;
pub use material::{ByteMaterial, SecureBytes};
pub use params::{Argon2Params, Type, Version};
pub use salt::{OsSaltGenerator, SaltGenerator};
pub use settings::Argon2Settings;
pub use verifier::{EncodedHash, NoHash, RawHash, Verifier};

#[doc(hidden)]
pub mod __private {
    pub use inventory;
}

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_builders_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Hasher>();
        assert_send_sync::<Verifier>();
        assert_send_sync::<Verifier<EncodedHash>>();
        assert_send_sync::<Verifier<RawHash>>();
        assert_send_sync::<LowLevelApi>();
    }
}
