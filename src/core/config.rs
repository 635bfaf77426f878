//! Config file loading and saving
//!
//! Tuning structs (movement, platforming) are plain serde types. Implementing
//! [`ConfigFile`] gives them RON and JSON loading with validation on the way in.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serializable configuration with a validation step.
pub trait ConfigFile: Serialize + DeserializeOwned + Sized {
    /// Check the invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Parse and validate a RON string
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::from_str(content).map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if parsing or validation fails
    fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ConfigError::DeserializeError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, picking the format from the extension (`.json`, anything else is RON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated
    fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_ron_str(&content)?
        };

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the config as RON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Save the config as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    fn save_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Errors that can occur while loading or validating configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// A value is out of its allowed range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::Invalid(e) => write!(f, "Invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
