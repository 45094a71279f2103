//! Prescription bundles.
//!
//! Layout of an assembled prescription (header first, then in this order):
//! `MedicationRequest`, `Medication`, `Patient`, `Organization`, `Coverage`, `Practitioner`.
//!
//! The medication request points at the patient, the prescriber, the coverage and the
//! medication; the coverage points back at the patient as its beneficiary. The header names the
//! patient as subject, the prescriber as author and the organization as custodian, and has one
//! section each for the request and the coverage.

use chrono::{DateTime, NaiveDate, Utc};
use erx_core::{
    DocumentAssembler, FieldPath, FixupQueue, ReferenceFixup, ReferenceRewriter, Replacement,
    ResourceDraft, ResourceKind,
};
use erx_types::{NonEmptyText, PrescriptionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::bundle::AssembledBundle;
use crate::composition::CompositionBuilder;
use crate::systems::{
    BSNR_SYSTEM, IKNR_SYSTEM, KBV_BUNDLE_PROFILE, KBV_COMPOSITION_PROFILE, KBV_FORMULAR_ART,
    KBV_INSURANCE_KIND, KBV_SECTION_TYPES, KVNR_SYSTEM, LANR_SYSTEM, PRESCRIPTION_ID_SYSTEM,
    PZN_SYSTEM,
};
use crate::yaml::parse_yaml;
use crate::FhirResult;

const FORMULAR_ART: &str = "e16A";
const COMPOSITION_TITLE: &str = "elektronische Arzneimittelverordnung";
const SECTION_PRESCRIPTION: &str = "Prescription";
const SECTION_COVERAGE: &str = "Coverage";

const BENEFICIARY_REFERENCE: &str = "/beneficiary/reference";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientData {
    pub given: NonEmptyText,
    pub family: NonEmptyText,
    /// Health insurance number (KVNR).
    pub kvnr: NonEmptyText,
    pub birth_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PractitionerData {
    pub given: NonEmptyText,
    pub family: NonEmptyText,
    /// Lifelong physician number (LANR).
    pub lanr: NonEmptyText,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicalOrganizationData {
    pub name: NonEmptyText,
    /// Practice site number (BSNR).
    pub bsnr: NonEmptyText,
}

/// Insurance kind code of a coverage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InsuranceKind {
    #[default]
    Gkv,
    Pkv,
    Bg,
    Sel,
}

impl InsuranceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceKind::Gkv => "GKV",
            InsuranceKind::Pkv => "PKV",
            InsuranceKind::Bg => "BG",
            InsuranceKind::Sel => "SEL",
        }
    }
}

impl fmt::Display for InsuranceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoverageData {
    pub payor_name: NonEmptyText,
    /// Institution code (IK number) of the insurer.
    pub payor_iknr: NonEmptyText,
    #[serde(default)]
    pub kind: InsuranceKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicationData {
    pub pzn: NonEmptyText,
    pub name: NonEmptyText,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MedicationRequestData {
    pub authored_on: NaiveDate,
    pub quantity: u32,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default = "substitution_allowed_default")]
    pub substitution_allowed: bool,
}

fn substitution_allowed_default() -> bool {
    true
}

/// Everything a prescription bundle is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrescriptionData {
    pub prescription_id: PrescriptionId,
    pub patient: PatientData,
    pub practitioner: PractitionerData,
    pub organization: MedicalOrganizationData,
    pub coverage: CoverageData,
    pub medication: MedicationData,
    pub request: MedicationRequestData,
}

/// Pure prescription bundle operations.
///
/// This type is a namespace; it holds no state.
pub struct Prescription;

impl Prescription {
    /// Parses prescription data from YAML.
    pub fn parse(yaml_text: &str) -> FhirResult<PrescriptionData> {
        parse_yaml(yaml_text, "prescription")
    }

    /// Parses replacement coverage data from YAML.
    pub fn parse_coverage(yaml_text: &str) -> FhirResult<CoverageData> {
        parse_yaml(yaml_text, "coverage")
    }

    /// Assembles the prescription bundle for `data`.
    ///
    /// `date` fixes the composition date; `None` uses the current time.
    pub fn assemble(
        assembler: &DocumentAssembler,
        data: &PrescriptionData,
        date: Option<DateTime<Utc>>,
    ) -> FhirResult<AssembledBundle> {
        let mut header = CompositionBuilder::new(
            KBV_COMPOSITION_PROFILE,
            KBV_FORMULAR_ART,
            FORMULAR_ART,
            COMPOSITION_TITLE,
            KBV_SECTION_TYPES,
        )
        .reference("subject", ResourceKind::Patient)
        .author(ResourceKind::Practitioner, None)
        .reference("custodian", ResourceKind::Organization)
        .section(SECTION_PRESCRIPTION, ResourceKind::MedicationRequest)
        .section(SECTION_COVERAGE, ResourceKind::Coverage);
        if let Some(date) = date {
            header = header.date(date);
        }

        let dependents = vec![
            ResourceDraft::new(
                ResourceKind::MedicationRequest,
                request_payload(&data.request),
            ),
            ResourceDraft::new(ResourceKind::Medication, medication_payload(&data.medication)),
            ResourceDraft::new(ResourceKind::Patient, patient_payload(&data.patient)),
            ResourceDraft::new(
                ResourceKind::Organization,
                organization_payload(&data.organization),
            ),
            ResourceDraft::new(ResourceKind::Coverage, coverage_payload(&data.coverage)),
            ResourceDraft::new(
                ResourceKind::Practitioner,
                practitioner_payload(&data.practitioner),
            ),
        ];

        let links = [
            (ResourceKind::MedicationRequest, "/subject/reference", ResourceKind::Patient),
            (ResourceKind::MedicationRequest, "/requester/reference", ResourceKind::Practitioner),
            (ResourceKind::MedicationRequest, "/insurance/0/reference", ResourceKind::Coverage),
            (
                ResourceKind::MedicationRequest,
                "/medicationReference/reference",
                ResourceKind::Medication,
            ),
            (ResourceKind::Coverage, BENEFICIARY_REFERENCE, ResourceKind::Patient),
        ];
        let fixups = links
            .into_iter()
            .map(|(target, field, source)| -> FhirResult<ReferenceFixup> {
                Ok(ReferenceFixup::new(target, FieldPath::parse(field)?, source))
            })
            .collect::<FhirResult<FixupQueue>>()?;

        let document = assembler.assemble(header.build()?, dependents, fixups)?;
        tracing::debug!(
            prescription_id = %data.prescription_id,
            "assembled prescription bundle"
        );
        Ok(AssembledBundle::new(
            document,
            KBV_BUNDLE_PROFILE,
            data.prescription_id.clone(),
        ))
    }

    /// Swaps the coverage of an assembled prescription.
    ///
    /// The new coverage gets a fresh address; the medication request and the header are
    /// pointed at it and the beneficiary reference of the old coverage is carried over.
    /// `bundle` is left untouched.
    pub fn change_coverage(
        rewriter: &ReferenceRewriter,
        bundle: &AssembledBundle,
        coverage: &CoverageData,
    ) -> FhirResult<AssembledBundle> {
        let replacement = Replacement::new(ResourceKind::Coverage, coverage_payload(coverage))
            .carry_over(FieldPath::parse(BENEFICIARY_REFERENCE)?)
            .fresh_address();

        let document = rewriter.replace(bundle.document(), replacement)?;
        tracing::debug!(
            prescription_id = %bundle.prescription_id(),
            payor = %coverage.payor_name,
            "changed prescription coverage"
        );
        Ok(bundle.with_document(document))
    }
}

fn request_payload(request: &MedicationRequestData) -> Value {
    let mut payload = json!({
        "resourceType": "MedicationRequest",
        "status": "active",
        "intent": "order",
        "medicationReference": {},
        "subject": {},
        "requester": {},
        "insurance": [{}],
        "authoredOn": request.authored_on.format("%Y-%m-%d").to_string(),
        "dispenseRequest": { "quantity": { "value": request.quantity, "unit": "Packung" } },
        "substitution": { "allowedBoolean": request.substitution_allowed },
    });
    if let Some(dosage) = &request.dosage {
        payload["dosageInstruction"] = json!([{ "text": dosage }]);
    }
    payload
}

fn medication_payload(medication: &MedicationData) -> Value {
    json!({
        "resourceType": "Medication",
        "code": {
            "coding": [{ "system": PZN_SYSTEM, "code": medication.pzn.as_str() }],
            "text": medication.name.as_str()
        },
    })
}

fn patient_payload(patient: &PatientData) -> Value {
    json!({
        "resourceType": "Patient",
        "identifier": [{ "system": KVNR_SYSTEM, "value": patient.kvnr.as_str() }],
        "name": [{
            "use": "official",
            "family": patient.family.as_str(),
            "given": [patient.given.as_str()]
        }],
        "birthDate": patient.birth_date.format("%Y-%m-%d").to_string(),
    })
}

fn organization_payload(organization: &MedicalOrganizationData) -> Value {
    json!({
        "resourceType": "Organization",
        "identifier": [{ "system": BSNR_SYSTEM, "value": organization.bsnr.as_str() }],
        "name": organization.name.as_str(),
    })
}

fn coverage_payload(coverage: &CoverageData) -> Value {
    json!({
        "resourceType": "Coverage",
        "status": "active",
        "type": { "coding": [{ "system": KBV_INSURANCE_KIND, "code": coverage.kind.as_str() }] },
        "beneficiary": {},
        "payor": [{
            "identifier": { "system": IKNR_SYSTEM, "value": coverage.payor_iknr.as_str() },
            "display": coverage.payor_name.as_str()
        }],
    })
}

fn practitioner_payload(practitioner: &PractitionerData) -> Value {
    json!({
        "resourceType": "Practitioner",
        "identifier": [{ "system": LANR_SYSTEM, "value": practitioner.lanr.as_str() }],
        "name": [{
            "use": "official",
            "family": practitioner.family.as_str(),
            "given": [practitioner.given.as_str()]
        }],
    })
}

/// Identifier element written into bundles for `prescription_id`.
pub fn prescription_identifier(prescription_id: &PrescriptionId) -> Value {
    json!({ "system": PRESCRIPTION_ID_SYSTEM, "value": prescription_id.as_str() })
}
