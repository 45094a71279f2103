use crate::{FhirError, FhirResult};
use serde::de::DeserializeOwned;

/// Parses YAML into `T`, reporting the path of the first mismatching field.
///
/// `what` names the document kind in error messages (for example "dispensation").
pub(crate) fn parse_yaml<T: DeserializeOwned>(yaml_text: &str, what: &str) -> FhirResult<T> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

    serde_path_to_error::deserialize::<_, T>(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}
