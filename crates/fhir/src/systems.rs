//! Profile, extension, naming-system and code-system URLs written into resource payloads.

// Dispensation data (pharmacy billing)
pub const DAV_BUNDLE_PROFILE: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/StructureDefinition/DAV-PKV-PR-ERP-AbgabedatenBundle|1.2";
pub const DAV_COMPOSITION_PROFILE: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/StructureDefinition/DAV-PKV-PR-ERP-AbgabedatenComposition|1.2";
pub const DAV_PHARMACY_PROFILE: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/StructureDefinition/DAV-PKV-PR-ERP-Apotheke|1.2";
pub const DAV_INVOICE_PROFILE: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/StructureDefinition/DAV-PKV-PR-ERP-Abrechnungszeilen|1.2";
pub const DAV_DISPENSE_PROFILE: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/StructureDefinition/DAV-PKV-PR-ERP-Abgabeinformationen|1.2";
pub const DAV_BILLING_LINES_EXTENSION: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/StructureDefinition/DAV-EX-ERP-Abrechnungszeilen";
pub const DAV_COMPOSITION_TYPES: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/CodeSystem/DAV-CS-ERP-CompositionTypes";
pub const DAV_SECTION_TYPES: &str =
    "http://fhir.abda.de/eRezeptAbgabedaten/CodeSystem/DAV-CS-ERP-AbgabedatenSectionTypes";

// Prescription
pub const KBV_BUNDLE_PROFILE: &str = "https://fhir.kbv.de/StructureDefinition/KBV_PR_ERP_Bundle|1.1.0";
pub const KBV_COMPOSITION_PROFILE: &str =
    "https://fhir.kbv.de/StructureDefinition/KBV_PR_ERP_Composition|1.1.0";
pub const KBV_FORMULAR_ART: &str = "https://fhir.kbv.de/CodeSystem/KBV_CS_SFHIR_KBV_FORMULAR_ART";
pub const KBV_SECTION_TYPES: &str = "https://fhir.kbv.de/CodeSystem/KBV_CS_ERP_Section_Type";
pub const KBV_INSURANCE_KIND: &str = "http://fhir.de/CodeSystem/versicherungsart-de-basis";

// Identifiers
pub const PRESCRIPTION_ID_SYSTEM: &str =
    "https://gematik.de/fhir/erp/NamingSystem/GEM_ERP_NS_PrescriptionId";
pub const IKNR_SYSTEM: &str = "http://fhir.de/sid/arge-ik/iknr";
pub const KVNR_SYSTEM: &str = "http://fhir.de/sid/gkv/kvid-10";
pub const LANR_SYSTEM: &str = "https://fhir.kbv.de/NamingSystem/KBV_NS_Base_ANR";
pub const BSNR_SYSTEM: &str = "https://fhir.kbv.de/NamingSystem/KBV_NS_Base_BSNR";
pub const PZN_SYSTEM: &str = "http://fhir.de/CodeSystem/ifa/pzn";
