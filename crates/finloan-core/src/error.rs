//! Error types for FinLoan operations.
//!
//! This module defines [`FinloanError`], the error enum shared by the
//! configuration, logging, and storage layers. Errors are values with clear
//! messages; storage failures are usually logged and degraded by callers
//! instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`FinloanError`].
pub type Result<T> = std::result::Result<T, FinloanError>;

/// Error type for FinLoan infrastructure operations.
#[derive(Debug, Error)]
pub enum FinloanError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Storage key contains characters that cannot map to a file name
    #[error("Invalid storage key: {key:?}")]
    InvalidKey { key: String },

    /// JSON (de)serialization error
    #[error("JSON error in {context}: {message}")]
    Json {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in FinLoan)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl FinloanError {
    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create ~/.finloan/config.yaml or pass --config with an existing file")
            }
            Self::ConfigInvalid { .. } => Some("Check the YAML syntax of the configuration file"),
            Self::DirectoryCreation { .. } => {
                Some("Check permissions or pass --storage-dir / --log-dir")
            }
            Self::InvalidKey { .. } => {
                Some("Use letters, digits, '-', '_' and '.' in storage keys")
            }
            _ => None,
        }
    }
}
