use crate::{AssemblyError, AssemblyResult};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Discriminator of a resource participating in a document.
///
/// Within one document the engine resolves references by kind, so each kind that is the source
/// or target of a reference must occur exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// The header resource. Always entry 0.
    Composition,
    Organization,
    Invoice,
    MedicationDispense,
    Coverage,
    MedicationRequest,
    Medication,
    Patient,
    Practitioner,
}

impl ResourceKind {
    /// The kind every document uses as its header.
    pub const HEADER: ResourceKind = ResourceKind::Composition;

    pub fn is_header(&self) -> bool {
        *self == Self::HEADER
    }

    /// FHIR resource type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Composition => "Composition",
            Self::Organization => "Organization",
            Self::Invoice => "Invoice",
            Self::MedicationDispense => "MedicationDispense",
            Self::Coverage => "Coverage",
            Self::MedicationRequest => "MedicationRequest",
            Self::Medication => "Medication",
            Self::Patient => "Patient",
            Self::Practitioner => "Practitioner",
        }
    }

    /// Parses a FHIR resource type name (exact spelling).
    pub fn parse(s: &str) -> AssemblyResult<Self> {
        match s {
            "Composition" => Ok(Self::Composition),
            "Organization" => Ok(Self::Organization),
            "Invoice" => Ok(Self::Invoice),
            "MedicationDispense" => Ok(Self::MedicationDispense),
            "Coverage" => Ok(Self::Coverage),
            "MedicationRequest" => Ok(Self::MedicationRequest),
            "Medication" => Ok(Self::Medication),
            "Patient" => Ok(Self::Patient),
            "Practitioner" => Ok(Self::Practitioner),
            _ => Err(AssemblyError::InvalidInput(format!(
                "unknown resource kind: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_composition_is_header() {
        assert!(ResourceKind::Composition.is_header());
        assert!(!ResourceKind::Invoice.is_header());
        assert_eq!(ResourceKind::HEADER, ResourceKind::Composition);
    }

    #[test]
    fn parse_matches_display() {
        for kind in [
            ResourceKind::Composition,
            ResourceKind::Organization,
            ResourceKind::Invoice,
            ResourceKind::MedicationDispense,
            ResourceKind::Coverage,
            ResourceKind::MedicationRequest,
            ResourceKind::Medication,
            ResourceKind::Patient,
            ResourceKind::Practitioner,
        ] {
            assert_eq!(ResourceKind::parse(&kind.to_string()).unwrap(), kind);
        }
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let err = ResourceKind::parse("invoice").expect_err("kinds are case sensitive");
        assert!(matches!(err, AssemblyError::InvalidInput(msg) if msg.contains("invoice")));
    }
}
