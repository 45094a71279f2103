use crate::TextError;
use std::{fmt, str::FromStr};

/// Prescription identifier in `ddd.ddd.ddd.ddd.ddd.dd` form.
///
/// The first group names the prescription flow type (for example `160` for statutory and
/// `200` for private insurance prescriptions).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrescriptionId(String);

impl PrescriptionId {
    const GROUPS: [usize; 6] = [3, 3, 3, 3, 3, 2];

    /// Validates and wraps a prescription id.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidFormat`] if `input` does not match `ddd.ddd.ddd.ddd.ddd.dd`.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let input = input.trim();
        let groups: Vec<&str> = input.split('.').collect();
        let ok = groups.len() == Self::GROUPS.len()
            && groups
                .iter()
                .zip(Self::GROUPS)
                .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_digit()));

        if !ok {
            return Err(TextError::InvalidFormat(format!(
                "prescription id must look like 160.000.000.000.000.00, got '{}'",
                input
            )));
        }
        Ok(Self(input.to_owned()))
    }

    /// Flow type code (first group).
    pub fn flow_type(&self) -> &str {
        &self.0[..3]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrescriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PrescriptionId {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for PrescriptionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for PrescriptionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PrescriptionId::parse(&s).map_err(serde::de::Error::custom)
    }
}
