//! Constants used throughout the engine.

/// Address prefix for document-local references (`urn:uuid:<logical id>`).
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// Top-level payload field that receives the allocated logical id.
pub const RESOURCE_ID_FIELD: &str = "id";

/// Upper bound for configured address prefixes.
pub const MAX_ADDRESS_PREFIX_LEN: usize = 255;
