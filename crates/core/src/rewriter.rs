//! Replacing one resource of an assembled document.
//!
//! The replacement keeps the old entry's position and, by default, its logical id. Because
//! every reference in the document is the full address derived from that id, references held
//! by other entries stay valid without being touched. Only two things need explicit work:
//! - fields the new payload must inherit from the old one (for example a beneficiary
//!   back-reference the new resource's builder did not know), listed as carry-over fields;
//! - the header, whose bindings may copy data out of the replaced resource and are therefore
//!   re-applied.
//!
//! Fixups the document was assembled with that target the replaced resource are applied again
//! to the new payload, so its own outward references stay resolved.
//!
//! With [`AddressPolicy::Fresh`] the replaced entry gets a new id and every string in every
//! other entry that equals the old address is rewritten to the new one.

use crate::document::Document;
use crate::entry::{ResourceEntry, ResourceRef};
use crate::field_path::FieldPath;
use crate::fixup::{apply_fixups, apply_header_bindings, resolve, FixupQueue};
use crate::{AddressAllocator, AssemblyError, AssemblyResult, EngineConfig, ResourceKind};
use serde_json::Value;

/// Whether a replacement keeps the address of the resource it replaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressPolicy {
    #[default]
    Preserve,
    Fresh,
}

/// One requested substitution.
#[derive(Clone, Debug, PartialEq)]
pub struct Replacement {
    kind: ResourceKind,
    payload: Value,
    carry_over: Vec<FieldPath>,
    address_policy: AddressPolicy,
}

impl Replacement {
    pub fn new(kind: ResourceKind, payload: Value) -> Self {
        Self {
            kind,
            payload,
            carry_over: Vec::new(),
            address_policy: AddressPolicy::Preserve,
        }
    }

    /// Copies `field` from the replaced payload into the new one before substitution.
    pub fn carry_over(mut self, field: FieldPath) -> Self {
        self.carry_over.push(field);
        self
    }

    /// Allocates a new logical id instead of keeping the old one.
    pub fn fresh_address(mut self) -> Self {
        self.address_policy = AddressPolicy::Fresh;
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn address_policy(&self) -> AddressPolicy {
        self.address_policy
    }
}

/// Produces rewritten copies of assembled documents.
#[derive(Clone, Debug, Default)]
pub struct ReferenceRewriter {
    allocator: AddressAllocator,
}

impl ReferenceRewriter {
    pub fn new(allocator: AddressAllocator) -> Self {
        Self { allocator }
    }

    /// Builds a rewriter drawing fresh ids from the configuration's shared source.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.allocator())
    }

    /// Replaces the single entry of `kind` with a new payload.
    ///
    /// `document` is left untouched; the rewritten document is returned.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::MissingReference`] / [`AssemblyError::AmbiguousReference`] if the
    ///   document does not hold exactly one entry of the kind,
    /// - [`AssemblyError::InvalidFieldPath`] if a carry-over field is absent from the old
    ///   payload or can not be written into the new one,
    /// - [`AssemblyError::Resource`] if a fresh id can not be allocated.
    pub fn replace(
        &self,
        document: &Document,
        replacement: Replacement,
    ) -> AssemblyResult<Document> {
        let Replacement {
            kind,
            mut payload,
            carry_over,
            address_policy,
        } = replacement;

        let mut entries = document.entries().to_vec();
        let index = resolve(&entries, kind)?;
        let old = &entries[index];
        let old_address = old.full_address();

        for field in &carry_over {
            let value = field.read(old.payload()).cloned().ok_or_else(|| {
                AssemblyError::InvalidFieldPath {
                    kind,
                    path: field.to_string(),
                    reason: "field not present in replaced resource".into(),
                }
            })?;
            field
                .write(&mut payload, value)
                .map_err(|reason| AssemblyError::InvalidFieldPath {
                    kind,
                    path: field.to_string(),
                    reason,
                })?;
        }

        let logical_id = match address_policy {
            AddressPolicy::Preserve => old.logical_id(),
            AddressPolicy::Fresh => self.allocator.allocate()?,
        };
        let scheme = old.scheme().clone();

        entries[index] = ResourceEntry::new(ResourceRef::new(kind, logical_id, payload)?, scheme);
        let new_address = entries[index].full_address();

        let mut rewritten = 0;
        if new_address != old_address {
            for (idx, entry) in entries.iter_mut().enumerate() {
                if idx != index {
                    rewritten += rewrite_references(
                        entry.payload_mut(),
                        old_address.as_str(),
                        new_address.as_str(),
                    );
                }
            }
        }

        // references held by the replaced resource are derived again
        let own: FixupQueue = document
            .fixups()
            .iter()
            .filter(|fixup| fixup.target() == kind)
            .cloned()
            .collect();
        apply_fixups(&mut entries, own)?;

        apply_header_bindings(&mut entries, document.header_bindings())?;
        let rewritten_document = Document::from_parts(
            entries,
            document.fixups().to_vec(),
            document.header_bindings().to_vec(),
        )?;

        tracing::info!(
            %kind,
            %old_address,
            %new_address,
            carried_over = carry_over.len(),
            rewritten,
            "replaced document entry"
        );
        Ok(rewritten_document)
    }
}

/// Replaces every string equal to `old` inside `value`. Returns the number of replacements.
fn rewrite_references(value: &mut Value, old: &str, new: &str) -> usize {
    match value {
        Value::String(s) if s.as_str() == old => {
            *s = new.to_owned();
            1
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| rewrite_references(item, old, new))
            .sum(),
        Value::Object(map) => map
            .values_mut()
            .map(|item| rewrite_references(item, old, new))
            .sum(),
        _ => 0,
    }
}
