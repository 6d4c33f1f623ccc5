//! Deterministic stand-in backends for builder and discovery tests.
#![allow(dead_code)]

use std::sync::Mutex;

use argonkit_core::encoded;
use argonkit_core::{Argon2Backend, Argon2Params, BackendError, HashInput, Options};

/// Cheap, deterministic "hash": every input byte times seven, folded into
/// `length` bytes. Distinguishes every input without any real cryptography.
fn dummy_hash(length: usize, inputs: &[Option<&[u8]>]) -> Vec<u8> {
    if length == 0 {
        return Vec::new();
    }
    let mut hash = vec![0u8; length];
    let mut i = 0;
    for input in inputs.iter().flatten() {
        for &b in input.iter() {
            hash[i] = hash[i].wrapping_add(b.wrapping_mul(7));
            i = (i + 1) % length;
        }
    }
    hash
}

fn hash_of(length: usize, salt: &[u8], input: &HashInput<'_>) -> Vec<u8> {
    dummy_hash(
        length,
        &[Some(input.password), Some(salt), input.secret, input.ad],
    )
}

#[derive(Debug, Default)]
pub struct DummyBackend;

impl Argon2Backend for DummyBackend {
    fn raw_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        Ok(hash_of(params.hash_length as usize, salt, input))
    }

    fn encoded_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<String, BackendError> {
        let hash = self.raw_hash(params, salt, input)?;
        Ok(encoded::encode(params, salt, &hash))
    }

    fn verify_raw(
        &self,
        params: &Argon2Params,
        raw_hash: &[u8],
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        Ok(hash_of(params.hash_length as usize, salt, input) == raw_hash)
    }

    fn verify_encoded(
        &self,
        encoded: &str,
        _threads: Option<u32>,
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        let decoded = encoded::decode(encoded)
            .map_err(|e| BackendError::with_source("Invalid encoded hash", e))?;
        Ok(hash_of(decoded.hash.len(), &decoded.salt, input) == decoded.hash)
    }
}

/// Owned copy of one backend call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captured {
    pub params: Option<Argon2Params>,
    pub threads: Option<u32>,
    pub encoded: Option<String>,
    pub raw_hash: Option<Vec<u8>>,
    pub salt: Option<Vec<u8>>,
    pub password: Vec<u8>,
    pub secret: Option<Vec<u8>>,
    pub ad: Option<Vec<u8>>,
    pub options: Options,
}

impl Captured {
    fn from_input(input: &HashInput<'_>) -> Self {
        Self {
            password: input.password.to_vec(),
            secret: input.secret.map(<[u8]>::to_vec),
            ad: input.ad.map(<[u8]>::to_vec),
            options: input.options.clone(),
            ..Self::default()
        }
    }
}

/// [`DummyBackend`] that records the last call it received.
#[derive(Debug, Default)]
pub struct CapturingBackend {
    inner: DummyBackend,
    captured: Mutex<Option<Captured>>,
}

impl CapturingBackend {
    pub fn captured(&self) -> Captured {
        self.captured
            .lock()
            .expect("capture lock should not be poisoned")
            .clone()
            .expect("backend should have been called")
    }

    fn store(&self, captured: Captured) {
        *self
            .captured
            .lock()
            .expect("capture lock should not be poisoned") = Some(captured);
    }
}

impl Argon2Backend for CapturingBackend {
    fn raw_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        self.store(Captured {
            params: Some(*params),
            salt: Some(salt.to_vec()),
            ..Captured::from_input(input)
        });
        self.inner.raw_hash(params, salt, input)
    }

    fn encoded_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<String, BackendError> {
        self.store(Captured {
            params: Some(*params),
            salt: Some(salt.to_vec()),
            ..Captured::from_input(input)
        });
        self.inner.encoded_hash(params, salt, input)
    }

    fn verify_raw(
        &self,
        params: &Argon2Params,
        raw_hash: &[u8],
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        self.store(Captured {
            params: Some(*params),
            raw_hash: Some(raw_hash.to_vec()),
            salt: Some(salt.to_vec()),
            ..Captured::from_input(input)
        });
        self.inner.verify_raw(params, raw_hash, salt, input)
    }

    fn verify_encoded(
        &self,
        encoded: &str,
        threads: Option<u32>,
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        self.store(Captured {
            threads,
            encoded: Some(encoded.to_string()),
            ..Captured::from_input(input)
        });
        self.inner.verify_encoded(encoded, threads, input)
    }
}

/// Backend whose every call fails, as a real backend does on bad parameters.
#[derive(Debug, Default)]
pub struct RejectingBackend;

impl Argon2Backend for RejectingBackend {
    fn raw_hash(
        &self,
        params: &Argon2Params,
        _salt: &[u8],
        _input: &HashInput<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::new(format!(
            "memory cost {} is too small",
            params.memory_cost
        )))
    }

    fn encoded_hash(
        &self,
        params: &Argon2Params,
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<String, BackendError> {
        self.raw_hash(params, salt, input).map(|_| String::new())
    }

    fn verify_raw(
        &self,
        params: &Argon2Params,
        _raw_hash: &[u8],
        salt: &[u8],
        input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        self.raw_hash(params, salt, input).map(|_| false)
    }

    fn verify_encoded(
        &self,
        _encoded: &str,
        _threads: Option<u32>,
        _input: &HashInput<'_>,
    ) -> Result<bool, BackendError> {
        Err(BackendError::new("rejected"))
    }
}
