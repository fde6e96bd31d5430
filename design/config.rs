//! Builder configuration, stored in the same human-readable TOML format as
//! gnomon's model artifacts so it can travel next to a fitted model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label written into the constant column unless configured otherwise.
pub const DEFAULT_INTERCEPT_LABEL: &str = "Intercept";

/// Prefix used to name unlabeled genotype columns when label filling is on.
pub const GENOTYPE_LABEL_PREFIX: &str = "G";
/// Prefix used to name unlabeled covariate columns when label filling is on.
pub const COVARIATE_LABEL_PREFIX: &str = "C";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse TOML design configuration: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize design configuration to TOML format: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("The intercept label must not be empty.")]
    EmptyInterceptLabel,
}

/// Controls how the builder names and arranges the columns it emits.
///
/// Missing keys in a TOML document fall back to [`DesignConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Label of the constant 1.0 column.
    pub intercept_label: String,
    /// Whether [`crate::construction::DesignMatrixBuilder::build`] prepends the
    /// intercept. The named `*_intercept` operations always include it.
    pub include_intercept: bool,
    /// Name unlabeled source columns positionally (`G1`, `G2`, ..., `C1`, ...)
    /// instead of leaving the output label empty.
    pub fill_missing_labels: bool,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            intercept_label: DEFAULT_INTERCEPT_LABEL.to_string(),
            include_intercept: true,
            fill_missing_labels: false,
        }
    }
}

impl DesignConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.intercept_label.trim().is_empty() {
            return Err(ConfigError::EmptyInterceptLabel);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DesignConfig::from_toml_str("").unwrap();
        assert_eq!(config, DesignConfig::default());
        assert_eq!(config.intercept_label, "Intercept");
        assert!(config.include_intercept);
        assert!(!config.fill_missing_labels);
    }

    #[test]
    fn partial_document_overrides_only_named_keys() {
        let config = DesignConfig::from_toml_str("fill_missing_labels = true\n").unwrap();
        assert!(config.fill_missing_labels);
        assert!(config.include_intercept);
        assert_eq!(config.intercept_label, DEFAULT_INTERCEPT_LABEL);
    }

    #[test]
    fn blank_intercept_label_is_rejected() {
        let err = DesignConfig::from_toml_str("intercept_label = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyInterceptLabel));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = DesignConfig::from_toml_str("include_intercept = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError(_)));
    }

    #[test]
    fn serialized_config_parses_back_to_itself() {
        let config = DesignConfig {
            intercept_label: "(Intercept)".to_string(),
            include_intercept: false,
            fill_missing_labels: true,
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("intercept_label = \"(Intercept)\""));
        assert_eq!(DesignConfig::from_toml_str(&text).unwrap(), config);
    }
}
