//! Dispensation data bundles.
//!
//! A pharmacy reports each dispensed prescription for billing as a document with this shape:
//!
//! | position | resource             | references                                   |
//! |----------|----------------------|----------------------------------------------|
//! | 0        | `Composition`        | author, sections → pharmacy and dispense     |
//! | 1        | `Organization`       | -                                            |
//! | 2        | `Invoice`            | -                                            |
//! | 3        | `MedicationDispense` | billing-lines extension → invoice, performer → pharmacy |
//!
//! The author entry of the header also repeats the pharmacy name as its display.

use chrono::{DateTime, NaiveDate, Utc};
use erx_core::{
    DocumentAssembler, FieldPath, FixupQueue, ReferenceFixup, ResourceDraft, ResourceKind,
};
use erx_types::{NonEmptyText, PrescriptionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::bundle::AssembledBundle;
use crate::composition::CompositionBuilder;
use crate::systems::{
    DAV_BILLING_LINES_EXTENSION, DAV_BUNDLE_PROFILE, DAV_COMPOSITION_PROFILE,
    DAV_COMPOSITION_TYPES, DAV_DISPENSE_PROFILE, DAV_INVOICE_PROFILE, DAV_PHARMACY_PROFILE,
    DAV_SECTION_TYPES, IKNR_SYSTEM, PRESCRIPTION_ID_SYSTEM, PZN_SYSTEM,
};
use crate::yaml::parse_yaml;
use crate::{FhirError, FhirResult};

const SECTION_PHARMACY: &str = "Apotheke";
const SECTION_DISPENSE: &str = "Abgabeinformationen";
const COMPOSITION_TYPE: &str = "ERezeptAbgabedaten";

const BILLING_LINES_REFERENCE: &str = "/extension/0/valueReference/reference";
const PERFORMER_REFERENCE: &str = "/performer/0/actor/reference";
const PHARMACY_NAME: &str = "/name";

/// Dispensing pharmacy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PharmacyData {
    pub name: NonEmptyText,
    /// Institution code (IK number) of the pharmacy.
    pub iknr: NonEmptyText,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// One billed article.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceLineData {
    pub pzn: NonEmptyText,
    /// Gross price in EUR.
    pub gross_price: f64,
    /// VAT rate in percent.
    pub vat_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceData {
    pub lines: Vec<InvoiceLineData>,
}

impl InvoiceData {
    /// Sum of all line gross prices, rounded to cents.
    pub fn total_gross(&self) -> f64 {
        let total: f64 = self.lines.iter().map(|line| line.gross_price).sum();
        (total * 100.0).round() / 100.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispensedMedicationData {
    pub pzn: NonEmptyText,
    pub name: NonEmptyText,
    pub quantity: u32,
    pub handed_over: NaiveDate,
}

/// Everything a dispensation data bundle is built from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispensationData {
    pub prescription_id: PrescriptionId,
    pub pharmacy: PharmacyData,
    pub invoice: InvoiceData,
    pub medication: DispensedMedicationData,
}

/// Pure dispensation data bundle operations.
///
/// This type is a namespace; it holds no state.
pub struct Dispensation;

impl Dispensation {
    /// Parses dispensation data from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] naming the offending field if the YAML does not match
    /// the expected shape, and [`FhirError::InvalidInput`] if the invoice has no lines.
    pub fn parse(yaml_text: &str) -> FhirResult<DispensationData> {
        let data: DispensationData = parse_yaml(yaml_text, "dispensation")?;
        if data.invoice.lines.is_empty() {
            return Err(FhirError::InvalidInput(
                "invoice must contain at least one line".into(),
            ));
        }
        Ok(data)
    }

    /// Assembles the dispensation data bundle for `data`.
    ///
    /// `date` fixes the composition date; `None` uses the current time.
    pub fn assemble(
        assembler: &DocumentAssembler,
        data: &DispensationData,
        date: Option<DateTime<Utc>>,
    ) -> FhirResult<AssembledBundle> {
        let mut header = CompositionBuilder::new(
            DAV_COMPOSITION_PROFILE,
            DAV_COMPOSITION_TYPES,
            COMPOSITION_TYPE,
            COMPOSITION_TYPE,
            DAV_SECTION_TYPES,
        )
        .author(ResourceKind::Organization, Some(PHARMACY_NAME))
        .section(SECTION_PHARMACY, ResourceKind::Organization)
        .section(SECTION_DISPENSE, ResourceKind::MedicationDispense);
        if let Some(date) = date {
            header = header.date(date);
        }

        let dependents = vec![
            ResourceDraft::new(ResourceKind::Organization, pharmacy_payload(&data.pharmacy)),
            ResourceDraft::new(ResourceKind::Invoice, invoice_payload(&data.invoice)),
            ResourceDraft::new(
                ResourceKind::MedicationDispense,
                dispense_payload(&data.medication, &data.prescription_id),
            ),
        ];

        let mut fixups = FixupQueue::new();
        fixups
            .register(ReferenceFixup::new(
                ResourceKind::MedicationDispense,
                FieldPath::parse(BILLING_LINES_REFERENCE)?,
                ResourceKind::Invoice,
            ))
            .register(ReferenceFixup::new(
                ResourceKind::MedicationDispense,
                FieldPath::parse(PERFORMER_REFERENCE)?,
                ResourceKind::Organization,
            ));

        let document = assembler.assemble(header.build()?, dependents, fixups)?;
        tracing::debug!(
            prescription_id = %data.prescription_id,
            "assembled dispensation data bundle"
        );
        Ok(AssembledBundle::new(
            document,
            DAV_BUNDLE_PROFILE,
            data.prescription_id.clone(),
        ))
    }
}

fn pharmacy_payload(pharmacy: &PharmacyData) -> Value {
    let mut payload = json!({
        "resourceType": "Organization",
        "meta": { "profile": [DAV_PHARMACY_PROFILE] },
        "identifier": [{ "system": IKNR_SYSTEM, "value": pharmacy.iknr.as_str() }],
        "name": pharmacy.name.as_str(),
    });

    let mut address = serde_json::Map::new();
    if let Some(street) = &pharmacy.street {
        address.insert("line".into(), json!([street]));
    }
    if let Some(postal_code) = &pharmacy.postal_code {
        address.insert("postalCode".into(), json!(postal_code));
    }
    if let Some(city) = &pharmacy.city {
        address.insert("city".into(), json!(city));
    }
    if !address.is_empty() {
        address.insert("type".into(), json!("physical"));
        address.insert("country".into(), json!("D"));
        payload["address"] = json!([address]);
    }
    payload
}

fn invoice_payload(invoice: &InvoiceData) -> Value {
    let line_items: Vec<Value> = invoice
        .lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            json!({
                "sequence": idx + 1,
                "chargeItemCodeableConcept": {
                    "coding": [{ "system": PZN_SYSTEM, "code": line.pzn.as_str() }]
                },
                "priceComponent": [{
                    "type": "informational",
                    "factor": line.vat_rate,
                    "amount": { "value": line.gross_price, "currency": "EUR" }
                }]
            })
        })
        .collect();

    json!({
        "resourceType": "Invoice",
        "meta": { "profile": [DAV_INVOICE_PROFILE] },
        "status": "issued",
        "lineItem": line_items,
        "totalGross": { "value": invoice.total_gross(), "currency": "EUR" },
    })
}

fn dispense_payload(medication: &DispensedMedicationData, prescription_id: &PrescriptionId) -> Value {
    json!({
        "resourceType": "MedicationDispense",
        "meta": { "profile": [DAV_DISPENSE_PROFILE] },
        "extension": [{
            "url": DAV_BILLING_LINES_EXTENSION,
            "valueReference": {}
        }],
        "status": "completed",
        "authorizingPrescription": [{
            "identifier": { "system": PRESCRIPTION_ID_SYSTEM, "value": prescription_id.as_str() }
        }],
        "medicationCodeableConcept": {
            "coding": [{ "system": PZN_SYSTEM, "code": medication.pzn.as_str() }],
            "text": medication.name.as_str()
        },
        "quantity": { "value": medication.quantity },
        "performer": [{ "actor": {} }],
        "whenHandedOver": medication.handed_over.format("%Y-%m-%d").to_string(),
    })
}
