//! FHIR resource builders for assembled documents.
//!
//! This crate sits on top of `erx-core`. It knows the *content* of the resources in the two
//! document shapes the engine assembles:
//! - dispensation data bundles (pharmacy, invoice, dispensed medication)
//! - prescription bundles (medication request, medication, patient, prescriber, organization,
//!   coverage)
//!
//! For each shape it turns validated domain data into resource payloads, declares the
//! cross-references between them as fixups and header bindings, and hands everything to the
//! engine. Serialization of finished documents into FHIR `Bundle` JSON lives in [`bundle`].
//!
//! Domain data can be read from YAML files with strict, field-accurate error reporting.

pub mod bundle;
pub mod composition;
pub mod dispensation;
pub mod prescription;
pub mod systems;
mod yaml;

// Re-export facades
pub use bundle::AssembledBundle;
pub use dispensation::Dispensation;
pub use prescription::Prescription;

// Re-export public domain-level types
pub use composition::CompositionBuilder;
pub use dispensation::{
    DispensationData, DispensedMedicationData, InvoiceData, InvoiceLineData, PharmacyData,
};
pub use prescription::{
    CoverageData, InsuranceKind, MedicalOrganizationData, MedicationData, MedicationRequestData,
    PatientData, PractitionerData, PrescriptionData,
};

/// Errors returned by the `erx-fhir` crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("assembly failed: {0}")]
    Assembly(#[from] erx_core::AssemblyError),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
