//! Application configuration
//!
//! Loaded from TOML, then optionally overridden from the environment:
//!
//! ```toml
//! api_root = "/resources"
//! log_filter = "bulletin_app=debug,info"
//! ```
//!
//! | variable            | field        |
//! |---------------------|--------------|
//! | `BULLETIN_API_ROOT` | `api_root`   |
//! | `BULLETIN_LOG`      | `log_filter` |

use crate::errors::ConfigError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`BulletinConfig::api_root`].
pub const ENV_API_ROOT: &str = "BULLETIN_API_ROOT";
/// Environment variable overriding [`BulletinConfig::log_filter`].
pub const ENV_LOG_FILTER: &str = "BULLETIN_LOG";

/// Runtime configuration for the store and its workflows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletinConfig {
    /// Path prefix of the remote API, e.g. `/resources`.
    pub api_root: String,
    /// `tracing` env-filter directive string.
    pub log_filter: String,
}

impl Default for BulletinConfig {
    fn default() -> Self {
        Self {
            api_root: "/resources".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl BulletinConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply overrides from the process environment.
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from an explicit variable list.
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            match key.as_ref() {
                ENV_API_ROOT => self.api_root = value.into(),
                ENV_LOG_FILTER => self.log_filter = value.into(),
                _ => {}
            }
        }
        self.validate()
    }

    /// Check field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api_root.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "api_root",
                reason: format!("'{}' must start with '/'", self.api_root),
            });
        }
        if self.api_root.len() > 1 && self.api_root.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "api_root",
                reason: format!("'{}' must not end with '/'", self.api_root),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    // ─── Paths ───────────────────────────────────────────────────────────────

    /// Posts collection endpoint.
    #[must_use]
    pub fn posts_path(&self) -> String {
        format!("{}/posts", self.api_root)
    }

    /// Users collection endpoint.
    #[must_use]
    pub fn users_path(&self) -> String {
        format!("{}/users", self.api_root)
    }

    /// Incremental notifications endpoint. `since` is rendered as an
    /// RFC 3339 timestamp with millisecond precision, or empty.
    #[must_use]
    pub fn notifications_path(&self, since: Option<DateTime<Utc>>) -> String {
        let since = since
            .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        format!("{}/notifications?since={since}", self.api_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BulletinConfig::default();
        assert_eq!(config.posts_path(), "/resources/posts");
        assert_eq!(config.users_path(), "/resources/users");
        assert_eq!(config.notifications_path(None), "/resources/notifications?since=");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_notifications_path_with_cursor() {
        let since: DateTime<Utc> = "2024-05-01T12:30:00Z".parse().unwrap();
        assert_eq!(
            BulletinConfig::default().notifications_path(Some(since)),
            "/resources/notifications?since=2024-05-01T12:30:00.000Z"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BulletinConfig::from_toml_str("api_root = \"/api\"").unwrap();
        assert_eq!(config.api_root, "/api");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            BulletinConfig::from_toml_str("api_root = \"api\""),
            Err(ConfigError::Invalid { field: "api_root", .. })
        ));
        assert!(matches!(
            BulletinConfig::from_toml_str("api_root = \"/api/\""),
            Err(ConfigError::Invalid { field: "api_root", .. })
        ));
        assert!(matches!(
            BulletinConfig::from_toml_str("log_filter = \"  \""),
            Err(ConfigError::Invalid { field: "log_filter", .. })
        ));
        assert!(matches!(
            BulletinConfig::from_toml_str("api_root = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_merge_with_vars() {
        let mut config = BulletinConfig::default();
        config
            .merge_with_vars([
                ("BULLETIN_API_ROOT", "/v2"),
                ("BULLETIN_LOG", "debug"),
                ("UNRELATED", "x"),
            ])
            .unwrap();
        assert_eq!(config.api_root, "/v2");
        assert_eq!(config.log_filter, "debug");
        assert!(config.merge_with_vars([("BULLETIN_API_ROOT", "v3")]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_root = \"/fake\"\nlog_filter = \"warn\"").unwrap();
        let config = BulletinConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.posts_path(), "/fake/posts");
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BulletinConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
