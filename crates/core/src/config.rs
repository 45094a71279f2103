//! Engine runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the engine. The engine
//! itself never reads environment variables, so concurrent assemblies in one process and test
//! harnesses all see the same settings.
//!
//! The identifier source is built once here. Every allocator handed out by one configuration
//! (and by its clones) draws from that same source.

use crate::address::AddressScheme;
use crate::constants::URN_UUID_PREFIX;
use crate::{AddressAllocator, AssemblyError, AssemblyResult};
use erx_uuid::{IdSource, IdSourceKind};
use std::sync::Arc;

/// Engine configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    scheme: AddressScheme,
    id_source: IdSourceKind,
    source: Arc<dyn IdSource>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_scheme(AddressScheme::default(), IdSourceKind::default())
    }
}

impl EngineConfig {
    /// Create a new `EngineConfig`, validating the address prefix.
    pub fn new(address_prefix: &str, id_source: IdSourceKind) -> AssemblyResult<Self> {
        Ok(Self::with_scheme(AddressScheme::new(address_prefix)?, id_source))
    }

    fn with_scheme(scheme: AddressScheme, id_source: IdSourceKind) -> Self {
        Self {
            scheme,
            id_source,
            source: Arc::from(id_source.build()),
        }
    }

    pub fn scheme(&self) -> &AddressScheme {
        &self.scheme
    }

    pub fn address_prefix(&self) -> &str {
        self.scheme.prefix()
    }

    pub fn id_source(&self) -> IdSourceKind {
        self.id_source
    }

    /// The identifier source shared by every allocator of this configuration.
    pub fn source(&self) -> Arc<dyn IdSource> {
        Arc::clone(&self.source)
    }

    /// Builds an allocator over the shared identifier source.
    pub fn allocator(&self) -> AddressAllocator {
        AddressAllocator::from_config(self)
    }
}

/// Resolve the address prefix from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `urn:uuid:`.
pub fn address_prefix_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| URN_UUID_PREFIX.to_string())
}

/// Parse the identifier source from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`IdSourceKind::Random`].
pub fn id_source_from_env_value(value: Option<String>) -> AssemblyResult<IdSourceKind> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => v
            .parse::<IdSourceKind>()
            .map_err(|e| AssemblyError::InvalidInput(e.to_string())),
        None => Ok(IdSourceKind::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_urn_uuid_and_random_ids() {
        let config = EngineConfig::default();
        assert_eq!(config.address_prefix(), "urn:uuid:");
        assert_eq!(config.id_source(), IdSourceKind::Random);
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        assert_eq!(address_prefix_from_env_value(None), "urn:uuid:");
        assert_eq!(address_prefix_from_env_value(Some("  ".into())), "urn:uuid:");
        assert_eq!(
            address_prefix_from_env_value(Some(" https://pvs.example.org/fhir/ ".into())),
            "https://pvs.example.org/fhir/"
        );

        assert_eq!(id_source_from_env_value(None).unwrap(), IdSourceKind::Random);
        assert_eq!(
            id_source_from_env_value(Some("sequential".into())).unwrap(),
            IdSourceKind::Sequential
        );
    }

    #[test]
    fn rejects_unknown_id_source() {
        let err = id_source_from_env_value(Some("snowflake".into())).expect_err("unknown");
        match err {
            AssemblyError::InvalidInput(msg) => assert!(msg.contains("snowflake")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn allocators_share_one_identifier_source() {
        let config = EngineConfig::new("urn:uuid:", IdSourceKind::Sequential).unwrap();
        let first = config.allocator();
        let second = config.clone().allocator();

        let a = first.allocate().unwrap();
        let b = second.allocate().unwrap();
        let c = config.allocator().allocate().unwrap();

        assert_eq!(a.to_string(), "00000000-0000-4000-8000-000000000001");
        assert_eq!(b.to_string(), "00000000-0000-4000-8000-000000000002");
        assert_eq!(c.to_string(), "00000000-0000-4000-8000-000000000003");
    }

    #[test]
    fn new_validates_prefix() {
        assert!(EngineConfig::new("urn:uuid:", IdSourceKind::Sequential).is_ok());
        assert!(EngineConfig::new("no-terminator", IdSourceKind::Random).is_err());
    }
}
