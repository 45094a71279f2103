//! Composition (document header) construction.
//!
//! The header of a document is a FHIR `Composition` whose references to the dependents can not
//! be written up front: the dependents have no addresses yet. [`CompositionBuilder`] therefore
//! produces the skeleton payload plus one [`HeaderBinding`] per reference slot, and the engine
//! fills the slots once every dependent is addressed.

use crate::FhirResult;
use chrono::{DateTime, SecondsFormat, Utc};
use erx_core::{FieldPath, HeaderBinding, HeaderDraft, ResourceKind};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug)]
struct Section {
    code: String,
    source: ResourceKind,
}

#[derive(Clone, Debug)]
struct Author {
    source: ResourceKind,
    display_from: Option<&'static str>,
}

/// Builds a `Composition` header and its bindings.
#[derive(Clone, Debug)]
pub struct CompositionBuilder {
    profile: String,
    type_system: String,
    type_code: String,
    title: String,
    section_system: String,
    date: Option<DateTime<Utc>>,
    singles: Vec<(&'static str, ResourceKind)>,
    authors: Vec<Author>,
    sections: Vec<Section>,
}

impl CompositionBuilder {
    pub fn new(
        profile: &str,
        type_system: &str,
        type_code: &str,
        title: &str,
        section_system: &str,
    ) -> Self {
        Self {
            profile: profile.to_owned(),
            type_system: type_system.to_owned(),
            type_code: type_code.to_owned(),
            title: title.to_owned(),
            section_system: section_system.to_owned(),
            date: None,
            singles: Vec::new(),
            authors: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Fixes the composition date. Defaults to the time of [`build`](Self::build).
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Adds a single-valued reference element such as `subject` or `custodian`.
    pub fn reference(mut self, element: &'static str, source: ResourceKind) -> Self {
        self.singles.push((element, source));
        self
    }

    /// Adds an `author` entry. With `display_from` set, the author's `display` is copied from
    /// that field of the source resource.
    pub fn author(mut self, source: ResourceKind, display_from: Option<&'static str>) -> Self {
        self.authors.push(Author {
            source,
            display_from,
        });
        self
    }

    /// Adds a section with `code` holding one entry that references `source`.
    pub fn section(mut self, code: &str, source: ResourceKind) -> Self {
        self.sections.push(Section {
            code: code.to_owned(),
            source,
        });
        self
    }

    pub fn build(self) -> FhirResult<HeaderDraft> {
        let date = self.date.unwrap_or_else(Utc::now);

        let mut payload = Map::new();
        payload.insert("resourceType".into(), json!("Composition"));
        payload.insert("meta".into(), json!({ "profile": [self.profile] }));
        payload.insert("status".into(), json!("final"));
        payload.insert(
            "type".into(),
            json!({ "coding": [{ "system": self.type_system, "code": self.type_code }] }),
        );
        payload.insert(
            "date".into(),
            json!(date.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        payload.insert("title".into(), json!(self.title));

        let mut bindings = Vec::new();

        for (element, source) in &self.singles {
            payload.insert((*element).to_owned(), json!({}));
            bindings.push(HeaderBinding::address(
                path(&format!("/{element}/reference"))?,
                *source,
            ));
        }

        if !self.authors.is_empty() {
            payload.insert(
                "author".into(),
                Value::Array(self.authors.iter().map(|_| json!({})).collect()),
            );
        }
        for (idx, author) in self.authors.iter().enumerate() {
            bindings.push(HeaderBinding::address(
                path(&format!("/author/{idx}/reference"))?,
                author.source,
            ));
            if let Some(display_from) = author.display_from {
                bindings.push(HeaderBinding::copy(
                    path(&format!("/author/{idx}/display"))?,
                    author.source,
                    path(display_from)?,
                ));
            }
        }

        if !self.sections.is_empty() {
            let sections = self
                .sections
                .iter()
                .map(|section| {
                    json!({
                        "code": {
                            "coding": [{ "system": self.section_system, "code": section.code }]
                        },
                        "entry": [{}]
                    })
                })
                .collect();
            payload.insert("section".into(), Value::Array(sections));
        }
        for (idx, section) in self.sections.iter().enumerate() {
            bindings.push(HeaderBinding::address(
                path(&format!("/section/{idx}/entry/0/reference"))?,
                section.source,
            ));
        }

        Ok(bindings
            .into_iter()
            .fold(HeaderDraft::new(Value::Object(payload)), HeaderDraft::bind))
    }
}

fn path(pointer: &str) -> FhirResult<FieldPath> {
    Ok(FieldPath::parse(pointer)?)
}
