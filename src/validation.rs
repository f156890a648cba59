use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid Bitcoin address: {0}")]
    InvalidAddress(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

const MIN_ADDRESS_LEN: usize = 26;
const MAX_ADDRESS_LEN: usize = 62;
const ADDRESS_PREFIXES: [&str; 3] = ["1", "3", "bc1"];

/// Cheap syntactic check on a Bitcoin address: length and a known prefix.
/// Not a checksum verification.
pub fn is_valid_bitcoin_address(address: &str) -> bool {
    if address.len() < MIN_ADDRESS_LEN || address.len() > MAX_ADDRESS_LEN {
        return false;
    }

    ADDRESS_PREFIXES
        .iter()
        .any(|prefix| address.starts_with(prefix))
}

/// A limit/offset pair that has already been clamped to the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    /// Missing or non-positive limits take `default_limit`, limits above
    /// `max_limit` are clamped. A negative offset is rejected.
    pub fn new(
        limit: Option<i64>,
        offset: Option<i64>,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<Self, ValidationError> {
        let limit = match limit {
            Some(l) if l > 0 => l.min(max_limit),
            _ => default_limit.min(max_limit),
        };

        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(ValidationError::InvalidParameter(
                "offset must not be negative".to_string(),
            ));
        }

        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}
