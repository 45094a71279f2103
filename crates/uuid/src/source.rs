//! Identifier sources.
//!
//! The engine never generates identifiers itself; it asks an [`IdSource`]. Sources are shared
//! across concurrent assemblies (typically behind an `Arc`), so they use atomics or the
//! operating system's random generator and hold no per-document state.

use crate::{ResourceId, UuidError, UuidResult};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Largest counter value that fits into the final UUID group (12 hex digits).
const MAX_SEQUENCE: u64 = 0xffff_ffff_ffff;

/// Source of collision-free resource identifiers.
pub trait IdSource: Send + Sync + std::fmt::Debug {
    /// Allocates the next identifier.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::Exhausted`] if the source cannot issue further identifiers.
    fn next_id(&self) -> UuidResult<ResourceId>;
}

/// Random version 4 identifiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> UuidResult<ResourceId> {
        Ok(ResourceId::new())
    }
}

/// Deterministic, counter-based identifiers.
///
/// Identifiers have the shape `00000000-0000-4000-8000-<counter>` where `<counter>` is the
/// 12-digit lowercase hex rendering of a monotonically increasing counter starting at 1. Output
/// is reproducible across runs, which makes assembled documents diffable.
#[derive(Debug)]
pub struct SequentialIdSource {
    issued: AtomicU64,
    capacity: u64,
}

impl Default for SequentialIdSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialIdSource {
    /// Creates a source that can issue every representable counter value.
    pub fn new() -> Self {
        Self::with_capacity(MAX_SEQUENCE)
    }

    /// Creates a source that issues at most `capacity` identifiers.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            issued: AtomicU64::new(0),
            capacity: capacity.min(MAX_SEQUENCE),
        }
    }

    /// Number of identifiers issued so far.
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

impl IdSource for SequentialIdSource {
    fn next_id(&self) -> UuidResult<ResourceId> {
        let capacity = self.capacity;
        let previous = self
            .issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map_err(|issued| UuidError::Exhausted { issued })?;

        let counter = previous + 1;
        // version nibble 4, variant bits 10xx
        let bits: u128 = (0x4000_u128 << 64) | (0x8000_u128 << 48) | u128::from(counter);
        Ok(ResourceId::from_uuid(Uuid::from_u128(bits)))
    }
}

/// Which [`IdSource`] implementation to construct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdSourceKind {
    #[default]
    Random,
    Sequential,
}

impl IdSourceKind {
    /// Returns the configuration spelling of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Sequential => "sequential",
        }
    }

    /// Builds a fresh source of this kind.
    pub fn build(&self) -> Box<dyn IdSource> {
        match self {
            Self::Random => Box::new(RandomIdSource),
            Self::Sequential => Box::new(SequentialIdSource::new()),
        }
    }
}

impl FromStr for IdSourceKind {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            other => Err(UuidError::InvalidInput(format!(
                "unknown id source '{}' (expected 'random' or 'sequential')",
                other
            ))),
        }
    }
}
