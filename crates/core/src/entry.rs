//! Resources and the entries that carry them.

use crate::address::{AddressScheme, FullAddress};
use crate::constants::RESOURCE_ID_FIELD;
use crate::{AssemblyError, AssemblyResult, ResourceKind};
use erx_uuid::ResourceId;
use serde_json::Value;

/// A finished resource handed over by a builder, tagged with its kind but not yet addressed.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceDraft {
    kind: ResourceKind,
    payload: Value,
}

impl ResourceDraft {
    pub fn new(kind: ResourceKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub(crate) fn into_parts(self) -> (ResourceKind, Value) {
        (self.kind, self.payload)
    }
}

/// One resource instance owned by a document.
///
/// The logical id is fixed at construction. The payload is opaque to the engine apart from its
/// top-level `id` field, which always mirrors the logical id.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRef {
    kind: ResourceKind,
    logical_id: ResourceId,
    payload: Value,
}

impl ResourceRef {
    /// Binds `payload` to `logical_id`, stamping the id into the payload.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidInput`] if `payload` is not a JSON object.
    pub(crate) fn new(
        kind: ResourceKind,
        logical_id: ResourceId,
        mut payload: Value,
    ) -> AssemblyResult<Self> {
        let Value::Object(map) = &mut payload else {
            return Err(AssemblyError::InvalidInput(format!(
                "{} payload must be a JSON object",
                kind
            )));
        };
        map.insert(
            RESOURCE_ID_FIELD.to_owned(),
            Value::String(logical_id.to_string()),
        );

        Ok(Self {
            kind,
            logical_id,
            payload,
        })
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn logical_id(&self) -> ResourceId {
        self.logical_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Unit stored in a document: one resource plus the scheme its address derives from.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceEntry {
    resource: ResourceRef,
    scheme: AddressScheme,
}

impl ResourceEntry {
    pub(crate) fn new(resource: ResourceRef, scheme: AddressScheme) -> Self {
        Self { resource, scheme }
    }

    /// Full address of this entry, recomputed from the logical id.
    pub fn full_address(&self) -> FullAddress {
        self.scheme.address_of(&self.resource.logical_id)
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind
    }

    pub fn logical_id(&self) -> ResourceId {
        self.resource.logical_id
    }

    pub fn payload(&self) -> &Value {
        &self.resource.payload
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn scheme(&self) -> &AddressScheme {
        &self.scheme
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Value {
        &mut self.resource.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stamps_logical_id_into_payload() {
        let id = ResourceId::new();
        let resource = ResourceRef::new(
            ResourceKind::Invoice,
            id,
            json!({ "resourceType": "Invoice", "id": "builder-chosen" }),
        )
        .unwrap();

        assert_eq!(resource.payload()["id"], json!(id.to_string()));
        assert_eq!(resource.logical_id(), id);
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = ResourceRef::new(ResourceKind::Invoice, ResourceId::new(), json!([1, 2]))
            .expect_err("arrays are not resources");
        assert!(matches!(err, AssemblyError::InvalidInput(msg) if msg.contains("Invoice")));
    }

    #[test]
    fn entry_address_follows_scheme() {
        let id = ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let resource = ResourceRef::new(ResourceKind::Patient, id, json!({})).unwrap();
        let entry = ResourceEntry::new(resource, AddressScheme::urn_uuid());

        assert_eq!(
            entry.full_address().as_str(),
            "urn:uuid:550e8400-e29b-41d4-a716-446655440000"
        );
        assert_eq!(entry.full_address(), entry.full_address());
    }
}
