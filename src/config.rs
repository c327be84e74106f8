//! Configuration file parser for ~/.config/formulary/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde and reported with a warning.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `api_key` from the file.
pub const API_KEY_ENV: &str = "FORMULARY_API_KEY";

const DEFAULT_FIRESTORE_BASE: &str = "https://firestore.googleapis.com";
const DEFAULT_IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every field has a default, so any subset of keys can be specified.
/// `Debug` masks `api_key`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cloud project that owns the Firestore database.
    pub project_id: String,

    /// Firestore database id.
    pub database: String,

    /// Collection holding formula documents.
    pub collection: String,

    /// Web API key sent with Identity Toolkit and Firestore requests.
    pub api_key: Option<String>,

    /// Timeout for a single remote call, in seconds.
    pub request_timeout_secs: u64,

    /// Firestore REST root. Override to point at the emulator.
    pub firestore_base_url: String,

    /// Identity Toolkit REST root. Override to point at the emulator.
    pub identity_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: "(default)".to_string(),
            collection: "formulas".to_string(),
            api_key: None,
            request_timeout_secs: 15,
            firestore_base_url: DEFAULT_FIRESTORE_BASE.to_string(),
            identity_base_url: DEFAULT_IDENTITY_BASE.to_string(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("firestore_base_url", &self.firestore_base_url)
            .field("identity_base_url", &self.identity_base_url)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "project_id",
        "database",
        "collection",
        "api_key",
        "request_timeout_secs",
        "firestore_base_url",
        "identity_base_url",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            project = %config.project_id,
            collection = %config.collection,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Apply environment overrides. `FORMULARY_API_KEY` wins over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }

    /// Remote call timeout, never zero.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("formulary_config_test_{}", name));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.project_id.is_empty());
        assert_eq!(config.database, "(default)");
        assert_eq!(config.collection, "formulas");
        assert!(config.api_key.is_none());
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/formulary_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.collection, "formulas");
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.collection, "formulas");
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "project_id = \"perfumery\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.project_id, "perfumery");
        assert_eq!(config.collection, "formulas");
        assert_eq!(config.request_timeout_secs, 15);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let path = write_config(
            "full",
            r#"
project_id = "perfumery"
database = "prod"
collection = "blends"
api_key = "key-123"
request_timeout_secs = 5
firestore_base_url = "http://localhost:8080"
identity_base_url = "http://localhost:9099"
"#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.project_id, "perfumery");
        assert_eq!(config.database, "prod");
        assert_eq!(config.collection, "blends");
        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.firestore_base_url, "http://localhost:8080");
        assert_eq!(config.identity_base_url, "http://localhost:9099");
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "request_timeout_secs = \"soon\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "collection = \"blends\"\ntheme = \"dark\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.collection, "blends");
        cleanup(&path);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = Config {
            api_key: Some("super-secret-key-12345".to_string()),
            ..Config::default()
        };

        let debug_output = format!("{:?}", config);
        assert!(!debug_output.contains("super-secret-key-12345"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
