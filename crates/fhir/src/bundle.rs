//! Serialization of assembled documents into FHIR `Bundle` JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use erx_core::Document;
use erx_types::PrescriptionId;
use erx_uuid::ResourceId;
use serde_json::{json, Value};

use crate::prescription::prescription_identifier;

/// An assembled document together with what is needed to wrap it as a `Bundle`.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledBundle {
    document: Document,
    profile: &'static str,
    prescription_id: PrescriptionId,
}

impl AssembledBundle {
    pub(crate) fn new(
        document: Document,
        profile: &'static str,
        prescription_id: PrescriptionId,
    ) -> Self {
        Self {
            document,
            profile,
            prescription_id,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn profile(&self) -> &'static str {
        self.profile
    }

    pub fn prescription_id(&self) -> &PrescriptionId {
        &self.prescription_id
    }

    pub(crate) fn with_document(&self, document: Document) -> Self {
        Self {
            document,
            profile: self.profile,
            prescription_id: self.prescription_id.clone(),
        }
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Renders the bundle. Entries keep the document order (header first).
    pub fn to_json(&self, bundle_id: ResourceId, timestamp: DateTime<Utc>) -> Value {
        to_bundle_json(
            &self.document,
            bundle_id,
            self.profile,
            &self.prescription_id,
            timestamp,
        )
    }
}

/// Renders `document` as a `Bundle` of type `document`.
///
/// Every entry carries its `fullUrl`; the resource is the entry payload as is, which already
/// holds its logical id.
pub fn to_bundle_json(
    document: &Document,
    bundle_id: ResourceId,
    profile: &str,
    prescription_id: &PrescriptionId,
    timestamp: DateTime<Utc>,
) -> Value {
    let entries: Vec<Value> = document
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "fullUrl": entry.full_address().as_str(),
                "resource": entry.payload(),
            })
        })
        .collect();

    json!({
        "resourceType": "Bundle",
        "id": bundle_id.to_string(),
        "meta": {
            "lastUpdated": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            "profile": [profile],
        },
        "identifier": prescription_identifier(prescription_id),
        "type": "document",
        "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        "entry": entries,
    })
}
