//! Discovery through the environment override.

mod common;

use std::sync::Arc;

use argonkit_core::discovery::{self, BACKEND_ENV_VAR};
use argonkit_core::{register_backend, Hasher, LowLevelApi, Verifier};

use common::{DummyBackend, RejectingBackend};

register_backend!(named DummyBackend);
register_backend!(named RejectingBackend);

#[test]
fn test_override_selects_backend() {
    std::env::set_var(BACKEND_ENV_VAR, " discovery_override::DummyBackend ");

    let registered: Vec<_> = discovery::registrations().map(|r| r.name()).collect();
    assert!(registered.contains(&"discovery_override::DummyBackend"));
    assert!(discovery::registrations().all(|r| !r.is_service()));

    let first = discovery::backend().expect("override should resolve");
    let second = discovery::backend().expect("resolution should be cached");
    assert!(Arc::ptr_eq(&first, &second));

    let encoded = Hasher::new()
        .password("pw")
        .unwrap()
        .encoded_hash()
        .expect("hashing should use the discovered backend");
    assert!(Verifier::new()
        .password("pw")
        .unwrap()
        .hash_encoded(encoded.as_str())
        .verify()
        .unwrap());

    let api = LowLevelApi::discovered().unwrap();
    assert!(api.verify_encoded(&encoded, b"pw").unwrap());

    // an explicit named backend bypasses the cached one
    let err = Hasher::new()
        .backend_named("discovery_override::RejectingBackend")
        .unwrap()
        .password("pw")
        .unwrap()
        .encoded_hash()
        .unwrap_err();
    assert!(err.to_string().contains("too small"));

    // the cached backend is not re-resolved when the override changes
    std::env::set_var(BACKEND_ENV_VAR, "discovery_override::RejectingBackend");
    let third = discovery::backend().unwrap();
    assert!(Arc::ptr_eq(&first, &third));
}
