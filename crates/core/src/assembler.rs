//! Document assembly.
//!
//! [`DocumentAssembler::assemble`] runs four steps on an owned, private entry list:
//! 1. allocate a logical id for the header and every dependent,
//! 2. apply the pending [`ReferenceFixup`](crate::ReferenceFixup)s,
//! 3. apply the header bindings, which may read anything written in step 2,
//! 4. emit the entries with the header at index 0 and dependents in declaration order.
//!
//! Any failure drops the private entry list, so callers either get a verified [`Document`] or
//! an error.

use crate::document::Document;
use crate::entry::{ResourceDraft, ResourceEntry, ResourceRef};
use crate::fixup::{apply_fixups, apply_header_bindings, FixupQueue, HeaderBinding, ReferenceFixup};
use crate::{AddressAllocator, AssemblyError, AssemblyResult, EngineConfig, ResourceKind};
use serde_json::Value;

/// The header resource as handed over by its builder, plus its deferred references.
#[derive(Clone, Debug, PartialEq)]
pub struct HeaderDraft {
    payload: Value,
    bindings: Vec<HeaderBinding>,
}

impl HeaderDraft {
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            bindings: Vec::new(),
        }
    }

    /// Declares one header reference.
    pub fn bind(mut self, binding: HeaderBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn bindings(&self) -> &[HeaderBinding] {
        &self.bindings
    }
}

/// Builds documents from drafts and declared fixups.
#[derive(Clone, Debug, Default)]
pub struct DocumentAssembler {
    allocator: AddressAllocator,
}

impl DocumentAssembler {
    pub fn new(allocator: AddressAllocator) -> Self {
        Self { allocator }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.allocator())
    }

    pub fn allocator(&self) -> &AddressAllocator {
        &self.allocator
    }

    /// Assembles one document.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::Resource`] if identifier allocation fails,
    /// - [`AssemblyError::MissingReference`] / [`AssemblyError::AmbiguousReference`] if a fixup
    ///   or header binding names a kind with zero or several entries,
    /// - [`AssemblyError::InvalidFieldPath`] if a declared field does not exist,
    /// - [`AssemblyError::InvalidInput`] if a dependent is declared with the header kind or a
    ///   payload is not a JSON object.
    pub fn assemble(
        &self,
        header: HeaderDraft,
        dependents: Vec<ResourceDraft>,
        fixups: FixupQueue,
    ) -> AssemblyResult<Document> {
        if dependents.iter().any(|d| d.kind().is_header()) {
            return Err(AssemblyError::InvalidInput(format!(
                "dependents must not be of the header kind {}",
                ResourceKind::HEADER
            )));
        }

        let HeaderDraft { payload, bindings } = header;
        let fixup_count = fixups.len();

        // step 1
        let mut entries = Vec::with_capacity(dependents.len() + 1);
        entries.push(self.enter(ResourceKind::HEADER, payload)?);
        for draft in dependents {
            let (kind, payload) = draft.into_parts();
            entries.push(self.enter(kind, payload)?);
        }

        // step 2
        let applied: Vec<ReferenceFixup> = fixups.iter().cloned().collect();
        apply_fixups(&mut entries, fixups)?;

        // step 3
        apply_header_bindings(&mut entries, &bindings)?;

        // step 4: entries are already header-first in declaration order
        let document = Document::from_parts(entries, applied, bindings)?;

        tracing::info!(
            entries = document.len(),
            fixups = fixup_count,
            header = %document.header().full_address(),
            "assembled document"
        );
        Ok(document)
    }

    fn enter(&self, kind: ResourceKind, payload: Value) -> AssemblyResult<ResourceEntry> {
        let logical_id = self.allocator.allocate()?;
        let resource = ResourceRef::new(kind, logical_id, payload)?;
        Ok(ResourceEntry::new(resource, self.allocator.scheme().clone()))
    }
}
