mod loader;
pub mod secrets;
pub mod settings;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use settings::StrataSettings;
pub use value::{ConfigValue, FromConfigValue};

/// Environment variables with this prefix overlay config keys.
pub const ENV_PREFIX: &str = "STRATA_";

/// Profile used when neither `STRATA_PROFILE` nor an explicit profile is set.
pub const DEFAULT_PROFILE: &str = "dev";

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// The value has the right type but is not acceptable.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Trait for strongly-typed configuration sections.
pub trait ConfigProperties: Sized {
    /// The configuration key prefix (e.g., `"strata.migrations"`).
    fn prefix() -> &'static str;

    /// Construct from a loaded [`StrataConfig`].
    fn from_config(config: &StrataConfig) -> Result<Self, ConfigError>;
}

/// Tool configuration loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `strata.yaml` (base)
/// 2. `strata-{profile}.yaml` (profile override)
/// 3. `.env` file (loaded into process environment)
/// 4. `.env.{profile}` file (loaded into process environment)
/// 5. `STRATA_*` environment variables (`STRATA_DATABASE_URL` overrides `strata.database.url`)
///
/// `.env` files never overwrite already-set environment variables. String
/// values may carry `${VAR}` or `${file:/path}` placeholders.
///
/// Profile is determined by: `STRATA_PROFILE` env var > argument > default `"dev"`.
#[derive(Debug, Clone)]
pub struct StrataConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl StrataConfig {
    /// Load configuration from the current working directory.
    pub fn load(profile: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load configuration from the given project directory.
    pub fn load_from(dir: &Path, profile: Option<&str>) -> Result<Self, ConfigError> {
        let active_profile = std::env::var("STRATA_PROFILE")
            .ok()
            .or_else(|| profile.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let mut values = HashMap::new();

        loader::load_yaml_file(&dir.join("strata.yaml"), &mut values)?;
        loader::load_yaml_file(&dir.join(format!("strata-{active_profile}.yaml")), &mut values)?;

        // Missing .env files are fine.
        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        resolve_string_values(&mut values)?;
        loader::overlay_env(std::env::vars(), &mut values);

        tracing::debug!(profile = %active_profile, keys = values.len(), "Configuration loaded");

        Ok(StrataConfig {
            values,
            profile: active_profile,
        })
    }

    /// Create a config from a YAML string (useful for testing).
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(StrataConfig {
            values,
            profile: profile.to_string(),
        })
    }

    /// Create an empty config (useful for testing).
    pub fn empty() -> Self {
        StrataConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    /// Set a value programmatically.
    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Get a typed value for the given dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the key does not exist, or
    /// `ConfigError::TypeMismatch` if the value cannot be converted.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Get a typed value, falling back to `default` only when the key is missing.
    ///
    /// A present but unconvertible value is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.get(key) {
            Err(ConfigError::NotFound(_)) => Ok(default),
            other => other,
        }
    }

    /// Check whether a key exists in the config.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The active profile name.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Build a typed settings section.
    pub fn settings<C: ConfigProperties>(&self) -> Result<C, ConfigError> {
        C::from_config(self)
    }
}

/// Resolve `${...}` placeholders in all string values of the config map.
fn resolve_string_values(values: &mut HashMap<String, ConfigValue>) -> Result<(), ConfigError> {
    for value in values.values_mut() {
        if let ConfigValue::String(s) = value {
            if s.contains("${") {
                *s = secrets::resolve_placeholders(s)?;
            }
        }
    }
    Ok(())
}
