//! Errors for the terminal UI.

use std::io;

use thiserror::Error;

/// Errors that can occur while running the wizard UI.
#[derive(Debug, Error)]
pub enum TuiError {
    #[error("Terminal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TUI rendering failed: {0}")]
    RenderFailed(String),

    #[error("Form state error: {0}")]
    Form(#[from] finloan_form::FormError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TuiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Terminal failures end the session; everything else is shown as a
    /// banner and the wizard keeps running.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TuiError::Io(_) | TuiError::RenderFailed(_))
    }

    /// Hint printed after the session ends with this error.
    pub fn guidance(&self) -> &'static str {
        match self {
            TuiError::Io(_) | TuiError::RenderFailed(_) => {
                "Run finloan in an interactive terminal that supports raw mode"
            }
            TuiError::Form(_) | TuiError::Internal(_) => {
                "Check ~/.finloan/logs/finloan.log for details"
            }
        }
    }
}

/// Result type for UI operations.
pub type AppResult<T> = std::result::Result<T, TuiError>;
