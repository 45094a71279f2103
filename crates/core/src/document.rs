//! The assembled document.

use crate::address::FullAddress;
use crate::entry::ResourceEntry;
use crate::fixup::{resolve, BindingValue, HeaderBinding, ReferenceFixup};
use crate::{AssemblyError, AssemblyResult, ResourceKind};
use std::collections::HashSet;

/// An ordered, internally consistent set of cross-referencing resources.
///
/// Invariants (checked by [`Document::verify`] whenever a document is produced):
/// 1. exactly one entry is the header,
/// 2. the header is entry 0,
/// 3. no two entries share a logical id,
/// 4. every field written by a reference fixup holds the full address of its source entry, and
///    every address written by a header binding resolves to an entry of this document.
///
/// Outside callers only get read access. New documents are produced by
/// [`DocumentAssembler`](crate::DocumentAssembler) and
/// [`ReferenceRewriter`](crate::ReferenceRewriter).
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    entries: Vec<ResourceEntry>,
    fixups: Vec<ReferenceFixup>,
    header_bindings: Vec<HeaderBinding>,
}

impl Document {
    pub(crate) fn from_parts(
        entries: Vec<ResourceEntry>,
        fixups: Vec<ReferenceFixup>,
        header_bindings: Vec<HeaderBinding>,
    ) -> AssemblyResult<Self> {
        let document = Self {
            entries,
            fixups,
            header_bindings,
        };
        document.verify()?;
        Ok(document)
    }

    /// Entries in serialization order, header first.
    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The header entry.
    pub fn header(&self) -> &ResourceEntry {
        // verify() guarantees a header at index 0
        &self.entries[0]
    }

    /// Dependents in declaration order.
    pub fn dependents(&self) -> &[ResourceEntry] {
        &self.entries[1..]
    }

    /// The single entry of `kind`.
    pub fn entry(&self, kind: ResourceKind) -> AssemblyResult<&ResourceEntry> {
        let idx = resolve(&self.entries, kind)?;
        Ok(&self.entries[idx])
    }

    /// Full address of the single entry of `kind`.
    pub fn full_address(&self, kind: ResourceKind) -> AssemblyResult<FullAddress> {
        self.entry(kind).map(ResourceEntry::full_address)
    }

    /// Entry whose full address equals `address`.
    pub fn resolve_address(&self, address: &str) -> Option<&ResourceEntry> {
        self.entries
            .iter()
            .find(|entry| entry.full_address() == *address)
    }

    /// Position of the single entry of `kind`.
    pub fn position(&self, kind: ResourceKind) -> AssemblyResult<usize> {
        resolve(&self.entries, kind)
    }

    /// Reference fixups applied while assembling this document.
    pub fn fixups(&self) -> &[ReferenceFixup] {
        &self.fixups
    }

    pub fn header_bindings(&self) -> &[HeaderBinding] {
        &self.header_bindings
    }

    pub fn into_entries(self) -> Vec<ResourceEntry> {
        self.entries
    }

    /// Re-checks the document invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvariantViolated`] naming the first violated invariant.
    pub fn verify(&self) -> AssemblyResult<()> {
        let first = self
            .entries
            .first()
            .ok_or_else(|| AssemblyError::InvariantViolated("document has no entries".into()))?;

        if !first.kind().is_header() {
            return Err(AssemblyError::InvariantViolated(format!(
                "entry 0 must be the {} header, found {}",
                ResourceKind::HEADER,
                first.kind()
            )));
        }

        let headers = self
            .entries
            .iter()
            .filter(|entry| entry.kind().is_header())
            .count();
        if headers != 1 {
            return Err(AssemblyError::InvariantViolated(format!(
                "expected exactly one header, found {}",
                headers
            )));
        }

        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !seen.insert(entry.logical_id()) {
                return Err(AssemblyError::InvariantViolated(format!(
                    "logical id {} is used by more than one entry",
                    entry.logical_id()
                )));
            }
        }

        for fixup in &self.fixups {
            let target = self.entry(fixup.target())?;
            let expected = self.full_address(fixup.source())?;
            let written = fixup.field().read(target.payload()).and_then(|v| v.as_str());
            if written != Some(expected.as_str()) {
                return Err(AssemblyError::InvariantViolated(format!(
                    "field {} of {} does not hold the address of {}",
                    fixup.field(),
                    fixup.target(),
                    fixup.source()
                )));
            }
        }

        for binding in &self.header_bindings {
            if binding.value() != &BindingValue::Address {
                continue;
            }
            let written = binding
                .field()
                .read(first.payload())
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    AssemblyError::InvariantViolated(format!(
                        "header field {} holds no reference",
                        binding.field()
                    ))
                })?;
            if self.resolve_address(written).is_none() {
                return Err(AssemblyError::InvariantViolated(format!(
                    "header field {} references '{}' which is not in the document",
                    binding.field(),
                    written
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AddressScheme;
    use crate::entry::ResourceRef;
    use crate::FieldPath;
    use erx_uuid::ResourceId;
    use serde_json::{json, Value};

    fn entry(kind: ResourceKind, payload: Value) -> ResourceEntry {
        ResourceEntry::new(
            ResourceRef::new(kind, ResourceId::new(), payload).unwrap(),
            AddressScheme::urn_uuid(),
        )
    }

    fn invoice_fixup() -> ReferenceFixup {
        ReferenceFixup::new(
            ResourceKind::MedicationDispense,
            FieldPath::parse("/invoiceRef").unwrap(),
            ResourceKind::Invoice,
        )
    }

    #[test]
    fn verify_accepts_resolved_fixup_fields() {
        let invoice = entry(ResourceKind::Invoice, json!({}));
        let dispense = entry(
            ResourceKind::MedicationDispense,
            json!({ "invoiceRef": invoice.full_address().as_str() }),
        );
        let header = entry(ResourceKind::Composition, json!({}));

        Document::from_parts(vec![header, invoice, dispense], vec![invoice_fixup()], vec![])
            .unwrap();
    }

    #[test]
    fn verify_rejects_stale_fixup_field() {
        let entries = vec![
            entry(ResourceKind::Composition, json!({})),
            entry(ResourceKind::Invoice, json!({})),
            entry(
                ResourceKind::MedicationDispense,
                json!({ "invoiceRef": "urn:uuid:00000000-0000-4000-8000-0000000000ff" }),
            ),
        ];

        let err = Document::from_parts(entries, vec![invoice_fixup()], vec![])
            .expect_err("dangling fixup field");
        match err {
            AssemblyError::InvariantViolated(msg) => assert!(msg.contains("/invoiceRef"), "{msg}"),
            other => panic!("expected InvariantViolated, got {other:?}"),
        }
    }

    #[test]
    fn verify_rejects_missing_fixup_field() {
        let entries = vec![
            entry(ResourceKind::Composition, json!({})),
            entry(ResourceKind::Invoice, json!({})),
            entry(ResourceKind::MedicationDispense, json!({})),
        ];

        assert!(matches!(
            Document::from_parts(entries, vec![invoice_fixup()], vec![]),
            Err(AssemblyError::InvariantViolated(_))
        ));
    }
}
