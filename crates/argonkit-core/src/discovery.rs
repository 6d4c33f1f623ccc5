//! Process-wide backend discovery.
//!
//! Backends announce themselves with [`register_backend!`](crate::register_backend).
//! Resolution runs once per process, on first use:
//!
//! 1. If the `ARGONKIT_BACKEND` environment variable is set and not blank,
//!    the registered type it names is instantiated.
//! 2. Every registration marked as a service provider is instantiated.
//!
//! The two sets are merged by type name and exactly one backend must remain.
//! A resolved backend is cached for the lifetime of the process and cannot be
//! swapped; callers needing another backend pass one to the builder instead.
//! A failed resolution is not cached, so the next call tries again.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::backend::Argon2Backend;
use crate::error::{BackendError, DiscoveryError, Error, Result};

/// Environment variable naming a backend type to instantiate.
pub const BACKEND_ENV_VAR: &str = "ARGONKIT_BACKEND";

/// Shared handle to a backend.
pub type SharedBackend = Arc<dyn Argon2Backend>;

/// Factory producing a fresh backend instance.
pub type BackendFactory = fn() -> std::result::Result<SharedBackend, BackendError>;

/// How a registration participates in discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Discovered automatically.
    Service,
    /// Only instantiated when named by the override or `backend_named`.
    Named,
}

/// A backend type known to this process.
#[derive(Debug)]
pub struct BackendRegistration {
    name: &'static str,
    factory: BackendFactory,
    registration: Registration,
}

impl BackendRegistration {
    /// Describe a backend type and how to construct it.
    pub const fn new(
        name: &'static str,
        factory: BackendFactory,
        registration: Registration,
    ) -> Self {
        Self {
            name,
            factory,
            registration,
        }
    }

    /// Fully qualified type name of the backend.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this registration takes part in automatic discovery.
    pub fn is_service(&self) -> bool {
        self.registration == Registration::Service
    }

    fn instantiate(&self) -> std::result::Result<SharedBackend, BackendError> {
        (self.factory)()
    }
}

inventory::collect!(BackendRegistration);

/// Factory for backends constructible through [`Default`].
pub fn default_factory<T>() -> std::result::Result<SharedBackend, BackendError>
where
    T: Argon2Backend + Default + 'static,
{
    Ok(Arc::new(T::default()))
}

/// Register a backend type.
///
/// `register_backend!(MyBackend)` makes the type a discoverable service
/// provider. `register_backend!(named MyBackend)` only makes it resolvable by
/// name. Either form requires `MyBackend: Default`. The registered name is the
/// module path of the invocation followed by the type name.
#[macro_export]
macro_rules! register_backend {
    (named $ty:ident) => {
        $crate::register_backend!(@submit $ty, $crate::discovery::Registration::Named);
    };
    ($ty:ident) => {
        $crate::register_backend!(@submit $ty, $crate::discovery::Registration::Service);
    };
    (@submit $ty:ident, $registration:expr) => {
        $crate::__private::inventory::submit! {
            $crate::discovery::BackendRegistration::new(
                concat!(module_path!(), "::", stringify!($ty)),
                $crate::discovery::default_factory::<$ty>,
                $registration,
            )
        }
    };
}

static BACKEND: OnceCell<SharedBackend> = OnceCell::new();

/// The process-wide backend, resolving it on first call.
///
/// # Errors
///
/// Returns `Error::Discovery` if zero or several backends resolve, or if the
/// override names a type that cannot be instantiated.
pub fn backend() -> Result<SharedBackend> {
    BACKEND
        .get_or_try_init(|| {
            let override_name = std::env::var(BACKEND_ENV_VAR).ok();
            resolve(override_name.as_deref(), registrations())
        })
        .cloned()
}

/// All backend types registered in this process.
pub fn registrations() -> impl Iterator<Item = &'static BackendRegistration> {
    inventory::iter::<BackendRegistration>.into_iter()
}

/// Instantiate the registered backend type called `name`.
///
/// # Errors
///
/// Returns `Error::Configuration` if no such type is registered or its
/// factory fails.
pub fn instantiate(name: &str) -> Result<SharedBackend> {
    let (_, backend) = instantiate_from(name, registrations()).map_err(|reason| {
        Error::Configuration(format!(
            "Could not create backend instance from type {}: {}",
            name, reason
        ))
    })?;
    Ok(backend)
}

fn instantiate_from<'r>(
    name: &str,
    registrations: impl IntoIterator<Item = &'r BackendRegistration>,
) -> std::result::Result<(&'static str, SharedBackend), String> {
    let registration = registrations
        .into_iter()
        .find(|registration| registration.name == name.trim())
        .ok_or_else(|| "type is not registered".to_string())?;
    let backend = registration
        .instantiate()
        .map_err(|e| e.message().to_string())?;
    Ok((registration.name, backend))
}

/// Resolve exactly one backend from an optional override and registrations.
pub(crate) fn resolve<'r>(
    override_name: Option<&str>,
    registrations: impl IntoIterator<Item = &'r BackendRegistration>,
) -> Result<SharedBackend> {
    let registrations: Vec<&BackendRegistration> = registrations.into_iter().collect();
    let mut found: BTreeMap<&'static str, SharedBackend> = BTreeMap::new();

    if let Some(name) = override_name.filter(|name| !name.trim().is_empty()) {
        tracing::debug!(backend = name, "instantiating backend named by {}", BACKEND_ENV_VAR);
        let (name, backend) = instantiate_from(name, registrations.iter().copied())
            .map_err(|reason| DiscoveryError::Override {
                name: name.to_string(),
                reason,
            })?;
        found.insert(name, backend);
    }

    for registration in registrations.iter().filter(|r| r.is_service()) {
        match registration.instantiate() {
            Ok(backend) => {
                found.entry(registration.name).or_insert(backend);
            }
            Err(err) => {
                return Err(DiscoveryError::Override {
                    name: registration.name.to_string(),
                    reason: err.message().to_string(),
                }
                .into());
            }
        }
    }

    match found.len() {
        0 => Err(DiscoveryError::NoBackend(BACKEND_ENV_VAR).into()),
        1 => {
            let (name, backend) = found
                .into_iter()
                .next()
                .ok_or(DiscoveryError::NoBackend(BACKEND_ENV_VAR))?;
            tracing::debug!(backend = name, "resolved argon2 backend");
            Ok(backend)
        }
        _ => Err(DiscoveryError::MultipleBackends(
            found.keys().map(|name| name.to_string()).collect(),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HashInput;
    use crate::params::Argon2Params;

    #[derive(Default)]
    struct First;

    #[derive(Default)]
    struct Second;

    macro_rules! stub_backend {
        ($ty:ty) => {
            impl Argon2Backend for $ty {
                fn raw_hash(
                    &self,
                    params: &Argon2Params,
                    _salt: &[u8],
                    _input: &HashInput<'_>,
                ) -> std::result::Result<Vec<u8>, BackendError> {
                    Ok(vec![0; params.hash_length as usize])
                }

                fn encoded_hash(
                    &self,
                    _params: &Argon2Params,
                    _salt: &[u8],
                    _input: &HashInput<'_>,
                ) -> std::result::Result<String, BackendError> {
                    Ok(String::new())
                }

                fn verify_raw(
                    &self,
                    _params: &Argon2Params,
                    _raw_hash: &[u8],
                    _salt: &[u8],
                    _input: &HashInput<'_>,
                ) -> std::result::Result<bool, BackendError> {
                    Ok(true)
                }

                fn verify_encoded(
                    &self,
                    _encoded: &str,
                    _threads: Option<u32>,
                    _input: &HashInput<'_>,
                ) -> std::result::Result<bool, BackendError> {
                    Ok(true)
                }
            }
        };
    }

    stub_backend!(First);
    stub_backend!(Second);

    fn failing_factory() -> std::result::Result<SharedBackend, BackendError> {
        Err(BackendError::new("no default constructor"))
    }

    const FIRST: BackendRegistration =
        BackendRegistration::new("tests::First", default_factory::<First>, Registration::Service);
    const FIRST_NAMED: BackendRegistration =
        BackendRegistration::new("tests::First", default_factory::<First>, Registration::Named);
    const SECOND: BackendRegistration =
        BackendRegistration::new("tests::Second", default_factory::<Second>, Registration::Service);
    const SECOND_NAMED: BackendRegistration =
        BackendRegistration::new("tests::Second", default_factory::<Second>, Registration::Named);
    const BROKEN: BackendRegistration =
        BackendRegistration::new("tests::Broken", failing_factory, Registration::Named);

    #[test]
    fn test_no_backend() {
        let err = resolve(None, std::iter::empty()).err().unwrap();
        assert!(matches!(err, Error::Discovery(DiscoveryError::NoBackend(_))));
        assert!(err.to_string().contains(BACKEND_ENV_VAR));
    }

    #[test]
    fn test_named_only_is_not_discovered() {
        let err = resolve(None, [&FIRST_NAMED]).err().unwrap();
        assert!(matches!(err, Error::Discovery(DiscoveryError::NoBackend(_))));
    }

    #[test]
    fn test_single_service() {
        let backend = resolve(None, [&FIRST]).unwrap();
        assert!(backend.name().ends_with("First"));
    }

    #[test]
    fn test_override_selects_named_type() {
        let backend = resolve(Some("tests::Second"), [&FIRST_NAMED, &SECOND_NAMED]).unwrap();
        assert!(backend.name().ends_with("Second"));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let backend = resolve(Some("   "), [&FIRST]).unwrap();
        assert!(backend.name().ends_with("First"));
    }

    #[test]
    fn test_override_and_same_service_merge() {
        let backend = resolve(Some("tests::First"), [&FIRST]).unwrap();
        assert!(backend.name().ends_with("First"));
    }

    #[test]
    fn test_override_and_other_service_conflict() {
        let err = resolve(Some("tests::First"), [&FIRST_NAMED, &SECOND])
            .err()
            .unwrap();
        match err {
            Error::Discovery(DiscoveryError::MultipleBackends(names)) => {
                assert_eq!(names.len(), 2);
                assert!(names.iter().any(|n| n.ends_with("First")));
                assert!(names.iter().any(|n| n.ends_with("Second")));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_two_services_conflict() {
        let err = resolve(None, [&FIRST, &SECOND]).err().unwrap();
        assert!(err.to_string().contains("Found more than one backend"));
    }

    #[test]
    fn test_unknown_override() {
        let err = resolve(Some("tests::Missing"), [&FIRST]).err().unwrap();
        assert!(matches!(err, Error::Discovery(DiscoveryError::Override { .. })));
        assert!(err.to_string().contains("tests::Missing"));
    }

    #[test]
    fn test_non_constructible_override() {
        let err = resolve(Some("tests::Broken"), [&BROKEN]).err().unwrap();
        assert!(err.to_string().contains("no default constructor"));
    }

    #[test]
    fn test_instantiate_from_unknown() {
        let reason = instantiate_from("nope", [&FIRST]).err().unwrap();
        assert_eq!(reason, "type is not registered");
    }
}
