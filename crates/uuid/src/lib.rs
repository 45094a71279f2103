//! Resource identifiers and identifier sources.
//!
//! Every resource placed into an assembled document receives a *logical id*. The same value is
//! used twice: as the engine's lookup key and as data written into the serialized resource (its
//! `id` field and, through the address prefix, every reference pointing at it).
//!
//! To keep addresses byte-stable, identifiers have a single *canonical* textual form:
//! **lowercase hyphenated UUID** (36 characters, `8-4-4-4-12`).
//!
//! This crate provides:
//! - A wrapper type ([`ResourceId`]) that *guarantees* the canonical format once constructed.
//! - The [`IdSource`] seam through which identifiers are allocated, with a random
//!   ([`RandomIdSource`]) and a deterministic counter-based ([`SequentialIdSource`])
//!   implementation.
//!
//! ## Canonical form
//! - Length: 36
//! - Characters: `0-9`, `a-f` and `-` at positions 8, 13, 18 and 23
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! ## Concurrency
//! An [`IdSource`] is the only state shared between concurrent assemblies, so every
//! implementation is `Send + Sync` and never blocks.

mod service;
mod source;

// Re-export public types
pub use service::{ResourceId, Uuid};
pub use source::{IdSource, IdSourceKind, RandomIdSource, SequentialIdSource};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The identifier source cannot produce any more identifiers
    #[error("identifier source exhausted after {issued} identifiers")]
    Exhausted { issued: u64 },
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
