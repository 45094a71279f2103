//! End-to-end checks: YAML input to bundle JSON.

use chrono::{TimeZone, Utc};
use erx_core::{
    AddressAllocator, AddressScheme, DocumentAssembler, ReferenceRewriter, ResourceKind,
    SequentialIdSource,
};
use erx_fhir::{Dispensation, Prescription};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

const DISPENSATION: &str = r#"
prescription_id: 200.100.000.000.081.90
pharmacy:
  name: Adler-Apotheke
  iknr: "308412345"
  street: Hauptstraße 1
  postal_code: "10115"
  city: Berlin
invoice:
  lines:
    - pzn: "06313728"
      gross_price: 28.85
      vat_rate: 19
medication:
  pzn: "06313728"
  name: Sumatriptan-1a Pharma 100 mg Tabletten
  quantity: 1
  handed_over: 2024-05-02
"#;

const PRESCRIPTION: &str = r#"
prescription_id: 160.000.100.000.001.05
patient: { given: Ludger, family: Königsstein, kvnr: X234567890, birth_date: 1935-06-22 }
practitioner: { given: Hans, family: Topp-Glücklich, lanr: "838382202" }
organization: { name: Hausarztpraxis, bsnr: "031234567" }
coverage: { payor_name: AOK Rheinland/Hamburg, payor_iknr: "104212059" }
medication: { pzn: "04773414", name: Ibuprofen 600 mg }
request: { authored_on: 2024-05-01, quantity: 1 }
"#;

fn sequential(prefix: &str) -> (DocumentAssembler, AddressAllocator) {
    let allocator = AddressAllocator::new(
        AddressScheme::new(prefix).unwrap(),
        Arc::new(SequentialIdSource::new()),
    );
    (DocumentAssembler::new(allocator.clone()), allocator)
}

/// Every `reference` string in every entry names the `fullUrl` of some entry.
fn assert_closed(bundle: &Value) {
    let entries = bundle["entry"].as_array().unwrap();
    let urls: HashSet<&str> = entries
        .iter()
        .map(|e| e["fullUrl"].as_str().unwrap())
        .collect();
    assert_eq!(urls.len(), entries.len(), "fullUrls must be unique");

    fn collect<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
        match value {
            Value::Object(map) => {
                for (key, item) in map {
                    match (key.as_str(), item) {
                        ("reference", Value::String(s)) => out.push(s),
                        _ => collect(item, out),
                    }
                }
            }
            Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
            _ => {}
        }
    }

    let mut references = Vec::new();
    for entry in entries {
        collect(&entry["resource"], &mut references);
    }
    assert!(!references.is_empty());
    for reference in references {
        assert!(urls.contains(reference), "dangling reference {reference}");
    }
}

#[test]
fn dispensation_bundle_is_deterministic_with_sequential_ids() {
    let (assembler, allocator) = sequential("urn:uuid:");
    let data = Dispensation::parse(DISPENSATION).unwrap();
    let date = Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap();

    let assembled = Dispensation::assemble(&assembler, &data, Some(date)).unwrap();
    let bundle = assembled.to_json(allocator.allocate().unwrap(), date);

    let urls: Vec<&str> = bundle["entry"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["fullUrl"].as_str().unwrap())
        .collect();
    assert_eq!(
        urls,
        vec![
            "urn:uuid:00000000-0000-4000-8000-000000000001",
            "urn:uuid:00000000-0000-4000-8000-000000000002",
            "urn:uuid:00000000-0000-4000-8000-000000000003",
            "urn:uuid:00000000-0000-4000-8000-000000000004",
        ]
    );
    assert_eq!(bundle["id"], "00000000-0000-4000-8000-000000000005");
    assert_eq!(bundle["entry"][0]["resource"]["date"], "2024-05-02T09:00:00Z");
    assert_eq!(bundle["entry"][2]["resource"]["totalGross"]["value"], 28.85);
    assert_closed(&bundle);
}

#[test]
fn custom_address_prefix_flows_into_every_reference() {
    let (assembler, allocator) = sequential("https://erx.example/fhir/");
    let data = Prescription::parse(PRESCRIPTION).unwrap();

    let assembled = Prescription::assemble(&assembler, &data, None).unwrap();
    let bundle = assembled.to_json(allocator.allocate().unwrap(), Utc::now());

    for entry in bundle["entry"].as_array().unwrap() {
        let url = entry["fullUrl"].as_str().unwrap();
        let id = entry["resource"]["id"].as_str().unwrap();
        assert_eq!(url, format!("https://erx.example/fhir/{id}"));
    }
    assert_eq!(
        bundle["entry"][1]["resource"]["subject"]["reference"],
        "https://erx.example/fhir/00000000-0000-4000-8000-000000000004"
    );
    assert_closed(&bundle);
}

#[test]
fn changed_coverage_bundle_stays_closed() {
    let (assembler, allocator) = sequential("urn:uuid:");
    let data = Prescription::parse(PRESCRIPTION).unwrap();
    let coverage =
        Prescription::parse_coverage("payor_name: Techniker Krankenkasse\npayor_iknr: \"101575519\"\n")
            .unwrap();

    let assembled = Prescription::assemble(&assembler, &data, None).unwrap();
    let changed = Prescription::change_coverage(
        &ReferenceRewriter::new(allocator.clone()),
        &assembled,
        &coverage,
    )
    .unwrap();

    // seven entries took ids 1..=7, the new coverage takes 8
    assert_eq!(
        changed
            .document()
            .full_address(ResourceKind::Coverage)
            .unwrap()
            .as_str(),
        "urn:uuid:00000000-0000-4000-8000-000000000008"
    );

    let bundle = changed.to_json(allocator.allocate().unwrap(), Utc::now());
    assert_eq!(bundle["entry"][5]["resource"]["resourceType"], "Coverage");
    assert_eq!(
        bundle["entry"][5]["resource"]["payor"][0]["display"],
        "Techniker Krankenkasse"
    );
    assert_closed(&bundle);
}
