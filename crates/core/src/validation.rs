//! Input validation utilities.

use crate::constants::MAX_ADDRESS_PREFIX_LEN;
use crate::{AssemblyError, AssemblyResult};

/// Validates that an address prefix can be prepended to a logical id to form a reference.
///
/// The prefix is written verbatim into every reference field of an assembled document:
/// - Rejects empty or overly long strings
/// - Restricts to printable ASCII without whitespace
/// - Requires a terminating `:` (URN style) or `/` (base URL style) so the logical id forms
///   its own segment
///
/// # Errors
///
/// Returns [`AssemblyError::InvalidInput`] if the prefix is invalid.
pub fn validate_address_prefix(prefix: &str) -> AssemblyResult<()> {
    if prefix.is_empty() {
        return Err(AssemblyError::InvalidInput(
            "address prefix cannot be empty".into(),
        ));
    }

    if prefix.len() > MAX_ADDRESS_PREFIX_LEN {
        return Err(AssemblyError::InvalidInput(format!(
            "address prefix exceeds maximum length of {} characters",
            MAX_ADDRESS_PREFIX_LEN
        )));
    }

    if !prefix.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(AssemblyError::InvalidInput(
            "address prefix must be printable ASCII without whitespace".into(),
        ));
    }

    if !(prefix.ends_with(':') || prefix.ends_with('/')) {
        return Err(AssemblyError::InvalidInput(format!(
            "address prefix must end with ':' or '/', got '{}'",
            prefix
        )));
    }

    Ok(())
}
