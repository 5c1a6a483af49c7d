//! # Error Types
//!
//! Configuration is the only place the engine reports errors. Everything on
//! the frame path degrades silently instead.

use thiserror::Error;

/// Errors that can occur while loading a configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid TOML.
    #[error("invalid config syntax: {0}")]
    Syntax(#[from] toml::de::Error),

    /// The responsive breakpoint table could not be used.
    #[error("invalid breakpoint table: {reason}")]
    Breakpoints {
        /// What was wrong with the table.
        reason: String,
    },

    /// A value has a type that cannot be flattened into an option string.
    #[error("unsupported value for option `{key}`")]
    UnsupportedValue {
        /// The flattened option key.
        key: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
