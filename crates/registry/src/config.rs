//! Registry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ticket_registry_storage::ConfigError;

use crate::ttl::DEFAULT_ABSOLUTE_TTL_THRESHOLD;

/// Default design document holding the ticket index.
pub const DEFAULT_DESIGN_DOCUMENT: &str = "statistics";

/// Default view name of the ticket index.
pub const DEFAULT_VIEW_NAME: &str = "all_tickets";

/// Default end-of-range sentinel appended to a prefix for range scans.
///
/// `U+02AD` sorts after every character that appears in generated ticket IDs.
pub const DEFAULT_END_TOKEN: char = '\u{02AD}';

/// Configuration for [`TicketRegistry`](crate::TicketRegistry).
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use ticket_registry::RegistryConfig;
///
/// let config = RegistryConfig::builder()
///     .view_name("tickets_by_id")
///     .absolute_ttl_threshold(Duration::from_secs(7 * 24 * 60 * 60))
///     .build()?;
///
/// assert_eq!(config.design_document(), "statistics");
/// assert_eq!(config.view_name(), "tickets_by_id");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Design document holding the ticket index view.
    #[serde(default = "default_design_document")]
    design_document: String,

    /// Name of the ticket index view.
    #[serde(default = "default_view_name")]
    view_name: String,

    /// Sentinel appended to a prefix to form the exclusive end of a range.
    #[serde(default = "default_end_token")]
    end_token: char,

    /// TTLs at or above this duration are flagged as presumed absolute.
    #[serde(with = "humantime_serde", default = "default_absolute_ttl_threshold")]
    absolute_ttl_threshold: Duration,

    /// Install the index design document during startup.
    #[serde(default = "default_ensure_index_on_startup")]
    ensure_index_on_startup: bool,
}

fn default_design_document() -> String {
    DEFAULT_DESIGN_DOCUMENT.to_owned()
}

fn default_view_name() -> String {
    DEFAULT_VIEW_NAME.to_owned()
}

fn default_end_token() -> char {
    DEFAULT_END_TOKEN
}

fn default_absolute_ttl_threshold() -> Duration {
    DEFAULT_ABSOLUTE_TTL_THRESHOLD
}

fn default_ensure_index_on_startup() -> bool {
    true
}

#[bon::bon]
impl RegistryConfig {
    /// Creates a configuration, validating every field.
    ///
    /// # Optional Fields
    ///
    /// * `design_document` - Index design document (default: `statistics`).
    /// * `view_name` - Index view (default: `all_tickets`).
    /// * `end_token` - Range sentinel (default: `U+02AD`).
    /// * `absolute_ttl_threshold` - TTL flagging threshold (default: 30 days).
    /// * `ensure_index_on_startup` - Install the index at startup (default: true).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - `design_document` or `view_name` is empty
    /// - `end_token` is an ASCII character
    /// - `absolute_ttl_threshold` is shorter than one second
    #[builder]
    pub fn new(
        #[builder(into, default = default_design_document())] design_document: String,
        #[builder(into, default = default_view_name())] view_name: String,
        #[builder(default = DEFAULT_END_TOKEN)] end_token: char,
        #[builder(default = DEFAULT_ABSOLUTE_TTL_THRESHOLD)] absolute_ttl_threshold: Duration,
        #[builder(default = true)] ensure_index_on_startup: bool,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            design_document,
            view_name,
            end_token,
            absolute_ttl_threshold,
            ensure_index_on_startup,
        };
        config.validate()?;
        Ok(config)
    }

    /// Re-checks the invariants enforced by the builder.
    ///
    /// Deserialized configurations bypass the builder; call this after
    /// loading one from a file.
    ///
    /// # Errors
    ///
    /// See [`RegistryConfig::builder`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.design_document.is_empty() {
            return Err(ConfigError::Empty { field: "design_document" });
        }
        if self.view_name.is_empty() {
            return Err(ConfigError::Empty { field: "view_name" });
        }
        if self.end_token.is_ascii() {
            return Err(ConfigError::Invalid {
                field: "end_token",
                reason: format!("{:?} sorts inside the ASCII range of ticket IDs", self.end_token),
            });
        }
        if self.absolute_ttl_threshold < Duration::from_secs(1) {
            return Err(ConfigError::BelowMinimum {
                field: "absolute_ttl_threshold",
                min: "1s".into(),
                value: format!("{:?}", self.absolute_ttl_threshold),
            });
        }
        Ok(())
    }

    /// Design document holding the index view.
    #[must_use]
    pub fn design_document(&self) -> &str {
        &self.design_document
    }

    /// Index view name.
    #[must_use]
    pub fn view_name(&self) -> &str {
        &self.view_name
    }

    /// Range sentinel.
    #[must_use]
    pub fn end_token(&self) -> char {
        self.end_token
    }

    /// TTL flagging threshold.
    #[must_use]
    pub fn absolute_ttl_threshold(&self) -> Duration {
        self.absolute_ttl_threshold
    }

    /// Whether startup installs the index design document.
    #[must_use]
    pub fn ensure_index_on_startup(&self) -> bool {
        self.ensure_index_on_startup
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            design_document: default_design_document(),
            view_name: default_view_name(),
            end_token: DEFAULT_END_TOKEN,
            absolute_ttl_threshold: DEFAULT_ABSOLUTE_TTL_THRESHOLD,
            ensure_index_on_startup: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::builder().build().unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.design_document(), "statistics");
        assert_eq!(config.view_name(), "all_tickets");
        assert_eq!(config.end_token(), '\u{02AD}');
        assert_eq!(config.absolute_ttl_threshold(), Duration::from_secs(2_592_000));
        assert!(config.ensure_index_on_startup());
    }

    #[test]
    fn test_empty_names_rejected() {
        let err = RegistryConfig::builder().design_document("").build().unwrap_err();
        assert_eq!(err, ConfigError::Empty { field: "design_document" });

        let err = RegistryConfig::builder().view_name("").build().unwrap_err();
        assert_eq!(err, ConfigError::Empty { field: "view_name" });
    }

    #[test]
    fn test_ascii_end_token_rejected() {
        let err = RegistryConfig::builder().end_token('~').build().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "end_token", .. }));
    }

    #[test]
    fn test_sub_second_threshold_rejected() {
        let err = RegistryConfig::builder()
            .absolute_ttl_threshold(Duration::from_millis(500))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::BelowMinimum { field: "absolute_ttl_threshold", .. }));
    }

    #[test]
    fn test_deserialize_with_humantime() {
        let json = r#"{ "view_name": "tickets", "absolute_ttl_threshold": "7days" }"#;
        let config: RegistryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.view_name(), "tickets");
        assert_eq!(config.absolute_ttl_threshold(), Duration::from_secs(7 * 86_400));
        assert_eq!(config.design_document(), "statistics");
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{ "bucket": "tickets" }"#;
        assert!(serde_json::from_str::<RegistryConfig>(json).is_err());
    }

    #[test]
    fn test_deserialized_config_can_be_invalid() {
        let json = r#"{ "end_token": "z" }"#;
        let config: RegistryConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }
}
