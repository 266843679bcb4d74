//! Document ID and value size validation.
//!
//! Stores reject oversized payloads before they reach the wire. The defaults
//! match the limits of the Couchbase-style document stores the registry is
//! deployed against.
//!
//! # Defaults
//!
//! | Limit | Default |
//! |-------|---------|
//! | `max_id_size` | 250 bytes |
//! | `max_value_size` | 20 971 520 bytes (20 MiB) |

use crate::{ConfigError, StorageError};

/// Default maximum document ID size in bytes.
pub const DEFAULT_MAX_ID_SIZE: usize = 250;

/// Default maximum document value size in bytes (20 MiB).
pub const DEFAULT_MAX_VALUE_SIZE: usize = 20 * 1024 * 1024;

/// Configurable size limits for document IDs and values.
///
/// Both limits must be at least 1.
///
/// # Example
///
/// ```
/// use ticket_registry_storage::SizeLimits;
///
/// let limits = SizeLimits::new(128, 1024 * 1024).unwrap();
/// assert_eq!(limits.max_id_size(), 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    max_id_size: usize,
    max_value_size: usize,
}

impl SizeLimits {
    /// Creates size limits with the given bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if either limit is zero.
    pub fn new(max_id_size: usize, max_value_size: usize) -> Result<Self, ConfigError> {
        if max_id_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_id_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        if max_value_size == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "max_value_size",
                min: "1".into(),
                value: "0".into(),
            });
        }
        Ok(Self { max_id_size, max_value_size })
    }

    /// Returns the maximum allowed document ID size in bytes.
    #[must_use]
    pub fn max_id_size(&self) -> usize {
        self.max_id_size
    }

    /// Returns the maximum allowed value size in bytes.
    #[must_use]
    pub fn max_value_size(&self) -> usize {
        self.max_value_size
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self { max_id_size: DEFAULT_MAX_ID_SIZE, max_value_size: DEFAULT_MAX_VALUE_SIZE }
    }
}

/// Validates document ID and value sizes against the given limits.
pub fn validate_sizes(id: &str, value: &[u8], limits: &SizeLimits) -> Result<(), StorageError> {
    validate_id_size(id, limits)?;
    if value.len() > limits.max_value_size {
        return Err(StorageError::size_limit_exceeded(
            "value",
            value.len(),
            limits.max_value_size,
        ));
    }
    Ok(())
}

/// Validates the document ID size only (reads and removals).
pub fn validate_id_size(id: &str, limits: &SizeLimits) -> Result<(), StorageError> {
    if id.len() > limits.max_id_size {
        return Err(StorageError::size_limit_exceeded("id", id.len(), limits.max_id_size));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_limits() {
        let limits = SizeLimits::default();
        assert_eq!(limits.max_id_size(), DEFAULT_MAX_ID_SIZE);
        assert_eq!(limits.max_value_size(), DEFAULT_MAX_VALUE_SIZE);
    }

    #[test]
    fn zero_id_size_rejected() {
        let err = SizeLimits::new(0, 1024).unwrap_err();
        assert!(err.to_string().contains("max_id_size"), "error should name the field: {err}");
    }

    #[test]
    fn zero_value_size_rejected() {
        let err = SizeLimits::new(1, 0).unwrap_err();
        assert!(err.to_string().contains("max_value_size"), "error should name the field: {err}");
    }

    #[rstest]
    #[case::within_limits(10, 20, 10, 20, true)]
    #[case::id_one_byte_over(5, 10, 6, 10, false)]
    #[case::value_one_byte_over(5, 10, 5, 11, false)]
    fn validate_sizes_parametric(
        #[case] max_id: usize,
        #[case] max_val: usize,
        #[case] id_size: usize,
        #[case] val_size: usize,
        #[case] should_pass: bool,
    ) {
        let limits = SizeLimits::new(max_id, max_val).unwrap();
        let id = "T".repeat(id_size);
        let result = validate_sizes(&id, &vec![0u8; val_size], &limits);
        assert_eq!(result.is_ok(), should_pass);
    }

    #[test]
    fn oversized_id_reports_details() {
        let limits = SizeLimits::new(4, 20).unwrap();
        let err = validate_id_size("TGT-12345", &limits).unwrap_err();
        assert!(matches!(
            err,
            StorageError::SizeLimitExceeded { kind: "id", actual: 9, limit: 4 }
        ));
    }
}
