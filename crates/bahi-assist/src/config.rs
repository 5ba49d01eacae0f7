//! # Assistant Configuration
//!
//! Configuration for the confirmation pipeline and its collaborators.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BAHI_DB_PATH=/var/lib/bahi/bahi.db                                 │
//! │     BAHI_LLM_API_KEY=sk-...   (the only source for the key)            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/bahi/bahi.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.bahi.bahi/bahi.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5 minute TTL, 30 s sweep, 0.6 min confidence                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # bahi.toml
//! [database]
//! path = "bahi.db"
//! max_connections = 5
//!
//! [stage]
//! ttl_secs = 300
//! sweep_interval_secs = 30
//!
//! [interpreter]
//! api_url = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! timeout_secs = 15
//! min_confidence = 0.6
//!
//! [owner]
//! id = "default-owner"
//! language = "en"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{AssistError, AssistResult};
use bahi_core::{Language, OwnerId, CONFIRMATION_TTL_SECS, DEFAULT_MIN_CONFIDENCE};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path. Created on first run.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("bahi.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Stage Settings
// =============================================================================

/// Lifetime of staged actions and how often expired ones are swept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSettings {
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_ttl() -> u64 {
    CONFIRMATION_TTL_SECS
}

fn default_sweep_interval() -> u64 {
    30
}

impl Default for StageSettings {
    fn default() -> Self {
        StageSettings {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

// =============================================================================
// Interpreter Settings
// =============================================================================

/// Settings for the language interpreter.
///
/// The API key is never read from or written to the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterSettings {
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on a single interpreter call (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Intents below this confidence are treated as not actionable.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_min_confidence() -> f32 {
    DEFAULT_MIN_CONFIDENCE
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        InterpreterSettings {
            api_url: default_api_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            min_confidence: default_min_confidence(),
            api_key: None,
        }
    }
}

// =============================================================================
// Owner Settings
// =============================================================================

/// The business account a console session acts for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerSettings {
    #[serde(default = "default_owner_id")]
    pub id: String,

    #[serde(default)]
    pub language: Language,
}

fn default_owner_id() -> String {
    "default-owner".to_string()
}

impl Default for OwnerSettings {
    fn default() -> Self {
        OwnerSettings {
            id: default_owner_id(),
            language: Language::default(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete assistant configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub stage: StageSettings,

    #[serde(default)]
    pub interpreter: InterpreterSettings,

    #[serde(default)]
    pub owner: OwnerSettings,
}

impl AssistConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (bahi.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> AssistResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path).map_err(|e| {
                    AssistError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            let mut config = Self::default();
            config.apply_env_overrides();
            config
        })
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> AssistResult<Self> {
        toml::from_str(contents).map_err(|e| AssistError::Config(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AssistResult<()> {
        if self.database.max_connections == 0 {
            return Err(AssistError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.stage.ttl_secs == 0 {
            return Err(AssistError::Config(
                "stage.ttl_secs must be greater than 0".into(),
            ));
        }

        if self.stage.sweep_interval_secs == 0 {
            return Err(AssistError::Config(
                "stage.sweep_interval_secs must be greater than 0".into(),
            ));
        }

        if self.interpreter.timeout_secs == 0 {
            return Err(AssistError::Config(
                "interpreter.timeout_secs must be greater than 0".into(),
            ));
        }

        let confidence = self.interpreter.min_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AssistError::Config(format!(
                "interpreter.min_confidence must be between 0 and 1, got: {}",
                confidence
            )));
        }

        let url = &self.interpreter.api_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AssistError::Config(format!(
                "interpreter.api_url must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.owner.id.trim().is_empty() {
            return Err(AssistError::Config("owner.id must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("BAHI_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(ttl) = std::env::var("BAHI_STAGE_TTL_SECS") {
            match ttl.parse::<u64>() {
                Ok(secs) => self.stage.ttl_secs = secs,
                Err(_) => warn!(value = %ttl, "Ignoring invalid BAHI_STAGE_TTL_SECS"),
            }
        }

        if let Ok(url) = std::env::var("BAHI_LLM_API_URL") {
            debug!(url = %url, "Overriding interpreter URL from environment");
            self.interpreter.api_url = url;
        }

        if let Ok(model) = std::env::var("BAHI_LLM_MODEL") {
            self.interpreter.model = model;
        }

        if let Ok(key) = std::env::var("BAHI_LLM_API_KEY") {
            if !key.trim().is_empty() {
                self.interpreter.api_key = Some(key);
            }
        }

        if let Ok(id) = std::env::var("BAHI_OWNER_ID") {
            self.owner.id = id;
        }

        if let Ok(lang) = std::env::var("BAHI_LANGUAGE") {
            match lang.parse() {
                Ok(parsed) => self.owner.language = parsed,
                Err(_) => warn!(language = %lang, "Unknown language in environment"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bahi", "bahi")
            .map(|dirs| dirs.config_dir().join("bahi.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.owner.id.trim())
    }

    pub fn stage_ttl(&self) -> Duration {
        Duration::from_secs(self.stage.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.stage.sweep_interval_secs)
    }

    pub fn interpreter_timeout(&self) -> Duration {
        Duration::from_secs(self.interpreter.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssistConfig::default();
        assert_eq!(config.stage.ttl_secs, 300);
        assert_eq!(config.stage_ttl(), Duration::from_secs(300));
        assert_eq!(config.interpreter.min_confidence, 0.6);
        assert_eq!(config.owner.language, Language::English);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = AssistConfig::from_toml(
            r#"
            [stage]
            ttl_secs = 60

            [owner]
            id = "shop-42"
            language = "hi"
            "#,
        )
        .unwrap();

        assert_eq!(config.stage.ttl_secs, 60);
        assert_eq!(config.stage.sweep_interval_secs, 30);
        assert_eq!(config.owner_id().as_str(), "shop-42");
        assert_eq!(config.owner.language, Language::Hindi);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let config = AssistConfig::from_toml(
            r#"
            [interpreter]
            api_key = "sk-from-file"
            "#,
        )
        .unwrap();
        assert!(config.interpreter.api_key.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AssistConfig::default();

        config.stage.ttl_secs = 0;
        assert!(config.validate().is_err());
        config.stage.ttl_secs = 300;

        config.interpreter.min_confidence = 1.5;
        assert!(config.validate().is_err());
        config.interpreter.min_confidence = 0.6;

        config.interpreter.api_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
        config.interpreter.api_url = "http://localhost:8080/v1/chat/completions".to_string();
        assert!(config.validate().is_ok());

        config.database.max_connections = 0;
        assert!(matches!(config.validate(), Err(AssistError::Config(_))));
    }

    #[test]
    fn test_toml_serialization() {
        let config = AssistConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[stage]"));
        assert!(toml_str.contains("[interpreter]"));
        assert!(!toml_str.contains("api_key"));
    }
}
