//! Addressing single fields inside opaque JSON payloads.
//!
//! A [`FieldPath`] is a JSON pointer (RFC 6901), for example
//! `/extension/0/valueReference/reference`. The engine only ever reads a whole value at a path
//! or writes one value to it; it never creates intermediate containers. Writing therefore needs
//! the parent object or array to exist already, which keeps a typo in a declared path from
//! silently growing a new branch in the payload.

use crate::{AssemblyError, AssemblyResult};
use serde_json::Value;
use std::fmt;

/// Validated JSON pointer to one payload field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pointer: String,
    parent: String,
    leaf: String,
}

impl FieldPath {
    /// Parses a JSON pointer.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidInput`] if the pointer is empty, does not start with
    /// `/`, contains an empty segment or an invalid `~` escape.
    pub fn parse(pointer: &str) -> AssemblyResult<Self> {
        let invalid = |reason: &str| {
            AssemblyError::InvalidInput(format!("invalid field path '{}': {}", pointer, reason))
        };

        let Some(body) = pointer.strip_prefix('/') else {
            return Err(invalid("must start with '/'"));
        };

        let mut segments = Vec::new();
        for raw in body.split('/') {
            if raw.is_empty() {
                return Err(invalid("empty segment"));
            }
            segments.push(unescape(raw).ok_or_else(|| invalid("bad '~' escape"))?);
        }

        let leaf = segments.pop().ok_or_else(|| invalid("no segments"))?;
        let parent = match pointer.rfind('/') {
            Some(idx) => pointer[..idx].to_owned(),
            None => String::new(),
        };

        Ok(Self {
            pointer: pointer.to_owned(),
            parent,
            leaf,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pointer
    }

    /// Reads the value at this path.
    pub fn read<'a>(&self, payload: &'a Value) -> Option<&'a Value> {
        payload.pointer(&self.pointer)
    }

    /// Writes `value` at this path, replacing whatever was there.
    ///
    /// Returns a human-readable reason when the parent container is missing, is not a
    /// container, or an array index is out of range.
    pub fn write(&self, payload: &mut Value, value: Value) -> Result<(), String> {
        let parent = payload
            .pointer_mut(&self.parent)
            .ok_or_else(|| format!("parent '{}' does not exist", self.parent))?;

        match parent {
            Value::Object(map) => {
                map.insert(self.leaf.clone(), value);
                Ok(())
            }
            Value::Array(items) => {
                let idx: usize = self
                    .leaf
                    .parse()
                    .map_err(|_| format!("'{}' is not an array index", self.leaf))?;
                let len = items.len();
                let slot = items
                    .get_mut(idx)
                    .ok_or_else(|| format!("index {} out of range (length {})", idx, len))?;
                *slot = value;
                Ok(())
            }
            _ => Err(format!("parent '{}' is not an object or array", self.parent)),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pointer)
    }
}

fn unescape(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_into_existing_object() {
        let mut payload = json!({ "performer": [{ "actor": { "reference": "plain-id" } }] });
        let path = FieldPath::parse("/performer/0/actor/reference").unwrap();

        path.write(&mut payload, json!("urn:uuid:abc")).unwrap();

        assert_eq!(path.read(&payload), Some(&json!("urn:uuid:abc")));
    }

    #[test]
    fn inserts_missing_leaf_key() {
        let mut payload = json!({ "subject": {} });
        let path = FieldPath::parse("/subject/reference").unwrap();

        path.write(&mut payload, json!("urn:uuid:abc")).unwrap();
        assert_eq!(payload["subject"]["reference"], "urn:uuid:abc");
    }

    #[test]
    fn refuses_to_create_parents() {
        let mut payload = json!({});
        let path = FieldPath::parse("/subject/reference").unwrap();

        let reason = path.write(&mut payload, json!("x")).expect_err("no parent");
        assert!(reason.contains("/subject"));
        assert_eq!(payload, json!({}));
    }

    #[test]
    fn refuses_out_of_range_index() {
        let mut payload = json!({ "section": [] });
        let path = FieldPath::parse("/section/0").unwrap();

        let reason = path.write(&mut payload, json!({})).expect_err("empty array");
        assert!(reason.contains("out of range"));
    }

    #[test]
    fn handles_escaped_segments() {
        let mut payload = json!({ "a/b": { "c~d": 1 } });
        let path = FieldPath::parse("/a~1b/c~0d").unwrap();

        path.write(&mut payload, json!(2)).unwrap();
        assert_eq!(payload["a/b"]["c~d"], 2);
    }

    #[test]
    fn parse_rejects_malformed_pointers() {
        for bad in ["", "subject", "/", "/a//b", "/a/~2"] {
            match FieldPath::parse(bad) {
                Err(AssemblyError::InvalidInput(msg)) => assert!(msg.contains("invalid field path")),
                other => panic!("expected InvalidInput for '{bad}', got {other:?}"),
            }
        }
    }
}
