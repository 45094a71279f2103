//! Deferred reference writes.
//!
//! Builders declare "write the address of B into field F of A" while neither A nor B has an
//! address yet. Declarations are collected in a [`FixupQueue`] in any order and resolved in one
//! pass once every entry has been allocated. Each fixup writes a disjoint `(target, field)`
//! pair and only reads addresses, never another fixup's output, so the order of application
//! does not affect the result.
//!
//! References held by the header are declared separately as [`HeaderBinding`]s. They are kept
//! in the document and applied after all other fixups, both during assembly and after every
//! rewrite.

use crate::entry::ResourceEntry;
use crate::field_path::FieldPath;
use crate::{AssemblyError, AssemblyResult, ResourceKind};
use serde_json::Value;
use std::collections::HashSet;

/// Write the full address of `source` into `field` of `target`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceFixup {
    target: ResourceKind,
    field: FieldPath,
    source: ResourceKind,
}

impl ReferenceFixup {
    pub fn new(target: ResourceKind, field: FieldPath, source: ResourceKind) -> Self {
        Self {
            target,
            field,
            source,
        }
    }

    pub fn target(&self) -> ResourceKind {
        self.target
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn source(&self) -> ResourceKind {
        self.source
    }
}

/// Pending fixups of one assembly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixupQueue {
    pending: Vec<ReferenceFixup>,
}

impl FixupQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pending fixup.
    pub fn register(&mut self, fixup: ReferenceFixup) -> &mut Self {
        self.pending.push(fixup);
        self
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceFixup> {
        self.pending.iter()
    }
}

impl FromIterator<ReferenceFixup> for FixupQueue {
    fn from_iter<I: IntoIterator<Item = ReferenceFixup>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}

impl Extend<ReferenceFixup> for FixupQueue {
    fn extend<I: IntoIterator<Item = ReferenceFixup>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

impl IntoIterator for FixupQueue {
    type Item = ReferenceFixup;
    type IntoIter = std::vec::IntoIter<ReferenceFixup>;

    fn into_iter(self) -> Self::IntoIter {
        self.pending.into_iter()
    }
}

/// What a header binding writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingValue {
    /// The source entry's full address.
    Address,
    /// A copy of the value at this path in the source payload (denormalized summary).
    Copy(FieldPath),
}

/// A header-targeted fixup, retained by the document and re-applied after rewrites.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderBinding {
    field: FieldPath,
    source: ResourceKind,
    value: BindingValue,
}

impl HeaderBinding {
    /// Header field `field` receives the full address of `source`.
    pub fn address(field: FieldPath, source: ResourceKind) -> Self {
        Self {
            field,
            source,
            value: BindingValue::Address,
        }
    }

    /// Header field `field` receives a copy of `source_field` from the `source` payload.
    pub fn copy(field: FieldPath, source: ResourceKind, source_field: FieldPath) -> Self {
        Self {
            field,
            source,
            value: BindingValue::Copy(source_field),
        }
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn source(&self) -> ResourceKind {
        self.source
    }

    pub fn value(&self) -> &BindingValue {
        &self.value
    }
}

/// Index of the single entry of `kind`.
///
/// # Errors
///
/// [`AssemblyError::MissingReference`] when no entry matches,
/// [`AssemblyError::AmbiguousReference`] when more than one does.
pub(crate) fn resolve(entries: &[ResourceEntry], kind: ResourceKind) -> AssemblyResult<usize> {
    let mut matches = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.kind() == kind)
        .map(|(idx, _)| idx);

    let first = matches
        .next()
        .ok_or(AssemblyError::MissingReference { kind })?;

    let others = matches.count();
    if others > 0 {
        return Err(AssemblyError::AmbiguousReference {
            kind,
            count: others + 1,
        });
    }

    Ok(first)
}

/// Fails with [`AssemblyError::InvalidInput`] if two writes share a `(kind, field)` pair.
fn ensure_disjoint<'a>(
    writes: impl IntoIterator<Item = (ResourceKind, &'a FieldPath)>,
) -> AssemblyResult<()> {
    let mut seen = HashSet::new();
    for (kind, field) in writes {
        if !seen.insert((kind, field)) {
            return Err(AssemblyError::InvalidInput(format!(
                "field {field} of {kind} is written by more than one reference"
            )));
        }
    }
    Ok(())
}

/// Applies every pending fixup against `entries`, consuming the queue.
///
/// Returns the number of fields written.
pub(crate) fn apply_fixups(
    entries: &mut [ResourceEntry],
    fixups: FixupQueue,
) -> AssemblyResult<usize> {
    ensure_disjoint(fixups.iter().map(|f| (f.target, &f.field)))?;

    let mut written = 0;

    for fixup in fixups {
        if fixup.target.is_header() {
            return Err(AssemblyError::InvalidInput(format!(
                "fixup for {} targets the header; declare it as a header binding",
                fixup.field
            )));
        }

        let source = resolve(entries, fixup.source)?;
        let target = resolve(entries, fixup.target)?;
        let address = entries[source].full_address();

        tracing::debug!(
            target_kind = %fixup.target,
            field = %fixup.field,
            source_kind = %fixup.source,
            %address,
            "applying reference fixup"
        );

        fixup
            .field
            .write(entries[target].payload_mut(), address.into())
            .map_err(|reason| AssemblyError::InvalidFieldPath {
                kind: fixup.target,
                path: fixup.field.to_string(),
                reason,
            })?;
        written += 1;
    }

    Ok(written)
}

/// Applies the header bindings to the header entry (the single entry of the header kind).
pub(crate) fn apply_header_bindings(
    entries: &mut [ResourceEntry],
    bindings: &[HeaderBinding],
) -> AssemblyResult<()> {
    ensure_disjoint(bindings.iter().map(|b| (ResourceKind::HEADER, &b.field)))?;
    let header = resolve(entries, ResourceKind::HEADER)?;

    for binding in bindings {
        if binding.source.is_header() {
            return Err(AssemblyError::InvalidInput(format!(
                "header binding for {} must not reference the header itself",
                binding.field
            )));
        }

        let source = resolve(entries, binding.source)?;
        let value = match &binding.value {
            BindingValue::Address => Value::from(entries[source].full_address()),
            BindingValue::Copy(source_field) => source_field
                .read(entries[source].payload())
                .cloned()
                .ok_or_else(|| AssemblyError::InvalidFieldPath {
                    kind: binding.source,
                    path: source_field.to_string(),
                    reason: "field not present in source payload".into(),
                })?,
        };

        binding
            .field
            .write(entries[header].payload_mut(), value)
            .map_err(|reason| AssemblyError::InvalidFieldPath {
                kind: ResourceKind::HEADER,
                path: binding.field.to_string(),
                reason,
            })?;
    }

    tracing::debug!(bindings = bindings.len(), "applied header bindings");
    Ok(())
}
