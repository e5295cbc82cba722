//! TOML configuration for a mapper and its parameter builder.
//!
//! Every section and key is optional; absent values take their defaults.
//! Unknown keys are rejected so typos surface as errors.

use crate::{
    DEFAULT_CHUNK_SIZE, DEFAULT_IDENTITY_SEPARATOR,
    error::{Error, ErrorOrigin},
    identity::IdentityFallback,
    mapper::Strategy,
    naming::NamingConvention,
    param::Dialect,
};
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::configuration(ErrorOrigin::Config, err.to_string())
    }
}

///
/// MapperConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub mapper: ExecutionConfig,
    pub identity: IdentityConfig,
    pub naming: NamingConfig,
    pub parameters: ParameterConfig,
}

impl MapperConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mapper.degree_of_parallelism == Some(0) {
            return Err(ConfigError::Invalid(
                "mapper.degree_of_parallelism must be at least 1".to_string(),
            ));
        }
        if self.mapper.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "mapper.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.identity.key.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid("identity.key cannot be empty".to_string()));
        }

        let placeholder = self.parameters.placeholder;
        if placeholder.is_alphanumeric() || placeholder.is_whitespace() || placeholder == '_' {
            return Err(ConfigError::Invalid(format!(
                "parameters.placeholder '{placeholder}' cannot start a parameter token"
            )));
        }
        if placeholder == '\'' || placeholder == '"' {
            return Err(ConfigError::Invalid(
                "parameters.placeholder cannot be a quote character".to_string(),
            ));
        }
        if self.parameters.positional_prefix.is_empty()
            || !self
                .parameters
                .positional_prefix
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Invalid(
                "parameters.positional_prefix must be a non-empty identifier".to_string(),
            ));
        }

        Ok(())
    }
}

///
/// ExecutionConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    pub strategy: Strategy,
    /// Worker count; the available parallelism when unset.
    pub degree_of_parallelism: Option<usize>,
    pub chunk_size: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            degree_of_parallelism: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

///
/// IdentityConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    pub separator: String,
    /// Digest key; a random per-resolver key when unset.
    pub key: Option<String>,
    pub fallback: IdentityFallback,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_IDENTITY_SEPARATOR.to_string(),
            key: None,
            fallback: IdentityFallback::default(),
        }
    }
}

///
/// NamingConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub convention: NamingConvention,
}

///
/// ParameterConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterConfig {
    pub placeholder: char,
    pub dialect: Dialect,
    pub positional_prefix: String,
}

impl Default for ParameterConfig {
    fn default() -> Self {
        Self {
            placeholder: '?',
            dialect: Dialect::default(),
            positional_prefix: "p".to_string(),
        }
    }
}

///
/// TESTS
///
