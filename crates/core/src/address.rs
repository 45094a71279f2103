//! Logical ids and full addresses.
//!
//! A full address is `prefix + logical id`. It is never stored next to the id it was derived
//! from; every caller recomputes it through [`AddressScheme::address_of`], so the two can not
//! drift apart when an entry is replaced.

use crate::config::EngineConfig;
use crate::constants::URN_UUID_PREFIX;
use crate::validation::validate_address_prefix;
use crate::AssemblyResult;
use erx_uuid::{IdSource, RandomIdSource, ResourceId};
use std::fmt;
use std::sync::Arc;

/// Stable, URI-like reference string of one resource within a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FullAddress(String);

impl FullAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<FullAddress> for String {
    fn from(address: FullAddress) -> Self {
        address.0
    }
}

impl From<FullAddress> for serde_json::Value {
    fn from(address: FullAddress) -> Self {
        serde_json::Value::String(address.0)
    }
}

impl PartialEq<str> for FullAddress {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// The fixed prefix that turns a logical id into a full address.
///
/// Cheap to clone; every [`ResourceEntry`](crate::ResourceEntry) keeps one so it can derive its
/// own address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressScheme {
    prefix: Arc<str>,
}

impl Default for AddressScheme {
    fn default() -> Self {
        Self::urn_uuid()
    }
}

impl AddressScheme {
    /// Creates a scheme with a validated prefix.
    pub fn new(prefix: &str) -> AssemblyResult<Self> {
        validate_address_prefix(prefix)?;
        Ok(Self {
            prefix: Arc::from(prefix),
        })
    }

    /// The `urn:uuid:` scheme used for document-local references.
    pub fn urn_uuid() -> Self {
        Self {
            prefix: Arc::from(URN_UUID_PREFIX),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the full address of `id`. Pure and repeatable.
    pub fn address_of(&self, id: &ResourceId) -> FullAddress {
        FullAddress(format!("{}{}", self.prefix, id))
    }

    /// Recovers the logical id from an address produced by this scheme.
    pub fn logical_id_of(&self, address: &str) -> Option<ResourceId> {
        address
            .strip_prefix(&*self.prefix)
            .and_then(|id| ResourceId::parse(id).ok())
    }
}

/// Allocates logical ids and derives their full addresses.
///
/// The identifier source is shared (`Arc`) so one allocator can be cloned into any number of
/// concurrent assemblies.
#[derive(Clone, Debug)]
pub struct AddressAllocator {
    scheme: AddressScheme,
    source: Arc<dyn IdSource>,
}

impl Default for AddressAllocator {
    fn default() -> Self {
        Self::new(AddressScheme::default(), Arc::new(RandomIdSource))
    }
}

impl AddressAllocator {
    pub fn new(scheme: AddressScheme, source: Arc<dyn IdSource>) -> Self {
        Self { scheme, source }
    }

    /// Builds an allocator from startup configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.scheme().clone(), config.source())
    }

    pub fn scheme(&self) -> &AddressScheme {
        &self.scheme
    }

    /// Allocates a fresh logical id.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Resource`](crate::AssemblyError::Resource) if the identifier
    /// source is exhausted or broken.
    pub fn allocate(&self) -> AssemblyResult<ResourceId> {
        let id = self.source.next_id()?;
        tracing::debug!(%id, "allocated logical id");
        Ok(id)
    }

    /// Derives the full address of `id` under this allocator's scheme.
    pub fn address_of(&self, id: &ResourceId) -> FullAddress {
        self.scheme.address_of(id)
    }
}
