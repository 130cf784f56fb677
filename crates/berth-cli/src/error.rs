//! CLI error types with exit code handling

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// The document failed to parse
    #[error("Validation failed: {message}")]
    #[diagnostic(code(berth::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Bad arguments, unknown content type, oversized input
    #[error("{message}")]
    #[diagnostic(code(berth::cli::usage))]
    Usage {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(berth::cli::io))]
    Io { message: String },

    /// Internal error (unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(berth::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: None,
        }
    }

    pub fn usage_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// IO error tied to the path it happened on
    pub fn io_at(path: &Path, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path.display(), err),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<berth_kube::ConvertError> for CliError {
    fn from(err: berth_kube::ConvertError) -> Self {
        match err {
            berth_kube::ConvertError::UnsupportedType(content_type) => {
                let known = berth_kube::default_registry()
                    .supported_types()
                    .unwrap_or_default();
                CliError::usage_with_help(
                    format!("Unsupported content type '{}'", content_type),
                    format!("Supported types: {}", known.join(", ")),
                )
            }
            berth_kube::ConvertError::Compose(err) => CliError::Validation {
                message: err.to_string(),
                help: err
                    .line()
                    .map(|line| format!("Check the document near line {}", line)),
            },
            other => CliError::internal(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
