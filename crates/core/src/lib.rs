//! # eRx Core
//!
//! Assembly engine for multi-resource documents (dispensation data bundles, prescription
//! bundles): a header resource plus dependents that reference each other by full address.
//!
//! The engine:
//! - allocates a logical id per resource and derives its full address
//!   ([`AddressAllocator`], [`AddressScheme`]),
//! - resolves forward references declared before any address existed ([`ReferenceFixup`],
//!   [`FixupQueue`], [`HeaderBinding`]),
//! - emits a header-first, verified [`Document`] ([`DocumentAssembler`]),
//! - replaces single resources of an existing document while keeping every reference valid
//!   ([`ReferenceRewriter`]).
//!
//! Resource payloads are opaque `serde_json::Value` objects. The engine reads whole values and
//! writes single declared fields; it does not know or validate any resource profile.
//!
//! **No I/O concerns**: reading inputs, serializing bundles and configuration lookup belong in
//! `erx-fhir` and the `erx` binary.

pub mod address;
pub mod assembler;
pub mod config;
pub mod constants;
pub mod document;
pub mod entry;
pub mod error;
pub mod field_path;
pub mod fixup;
pub mod kind;
pub mod rewriter;
pub mod validation;

pub use address::{AddressAllocator, AddressScheme, FullAddress};
pub use assembler::{DocumentAssembler, HeaderDraft};
pub use config::EngineConfig;
pub use document::Document;
pub use entry::{ResourceDraft, ResourceEntry, ResourceRef};
pub use error::{AssemblyError, AssemblyResult};
pub use field_path::FieldPath;
pub use fixup::{BindingValue, FixupQueue, HeaderBinding, ReferenceFixup};
pub use kind::ResourceKind;
pub use rewriter::{AddressPolicy, ReferenceRewriter, Replacement};

pub use erx_uuid::{IdSource, IdSourceKind, RandomIdSource, ResourceId, SequentialIdSource};
