//! Canonical resource identifier.

use crate::{UuidError, UuidResult};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Canonical logical id of one resource (lowercase hyphenated UUID).
///
/// This wrapper type guarantees that once constructed, the contained UUID renders in the
/// canonical form. Full addresses are derived by prefixing this rendering, so two equal
/// `ResourceId`s always yield byte-identical addresses.
///
/// # Construction
/// - [`ResourceId::new`] generates a new random identifier.
/// - [`ResourceId::parse`] validates an externally supplied identifier.
/// - [`ResourceId::from_uuid`] wraps an already generated UUID (used by identifier sources).
///
/// # Errors
/// [`ResourceId::parse`] returns [`UuidError::InvalidInput`] if the input is not already
/// canonical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Uuid);

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceId {
    /// Generates a new random identifier (RFC 4122 version 4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (uppercase, braced or simple).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "resource id must be a lowercase hyphenated UUID, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid resource id '{}': {}", input, e)))
    }

    /// Returns the inner `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// This is a purely syntactic check:
    /// - Exactly 36 bytes long
    /// - Hyphens at byte offsets 8, 13, 18 and 23
    /// - Lowercase hex characters (`0-9` and `a-f`) everywhere else
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ResourceId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_new_generates_canonical_id() {
        let id = ResourceId::new();
        let rendered = id.to_string();

        assert_eq!(rendered.len(), 36);
        assert!(ResourceId::is_canonical(&rendered));
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let id = ResourceId::parse(CANONICAL).expect("canonical id should parse");
        assert_eq!(id.to_string(), CANONICAL);
    }

    #[test]
    fn test_parse_rejects_simple_form() {
        let result = ResourceId::parse("550e8400e29b41d4a716446655440000");

        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("lowercase hyphenated UUID"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        assert!(ResourceId::parse("550E8400-E29B-41D4-A716-446655440000").is_err());
    }

    #[test]
    fn test_parse_rejects_misplaced_hyphen() {
        assert!(ResourceId::parse("550e840-0e29b-41d4-a716-446655440000").is_err());
    }

    #[test]
    fn test_is_canonical_edge_cases() {
        assert!(ResourceId::is_canonical(
            "00000000-0000-0000-0000-000000000000"
        ));
        assert!(!ResourceId::is_canonical(""));
        assert!(!ResourceId::is_canonical(
            "550e8400-e29b-41d4-a716-44665544000"
        ));
        assert!(!ResourceId::is_canonical(
            "550e8400-e29b-41d4-a716-4466554400zz"
        ));
        assert!(!ResourceId::is_canonical(
            "{550e8400-e29b-41d4-a716-446655440000}"
        ));
    }

    #[test]
    fn test_from_str_round_trip() {
        let original = ResourceId::new();
        let parsed: ResourceId = original.to_string().parse().expect("should parse");

        assert_eq!(original, parsed);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_uses_canonical_string() {
        let id = ResourceId::parse(CANONICAL).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{CANONICAL}\""));

        let err = serde_json::from_str::<ResourceId>("\"not-an-id\"")
            .expect_err("non-canonical ids must be rejected");
        assert!(err.to_string().contains("lowercase hyphenated UUID"));
    }
}
