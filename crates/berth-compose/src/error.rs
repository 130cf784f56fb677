//! Parser and normalizer error types

use thiserror::Error;

/// A field value that could not be brought into its canonical shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid entry '{entry}': {reason}")]
    InvalidEntry { entry: String, reason: String },
}

impl NormalizeError {
    pub(crate) fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::TypeMismatch { expected, found }
    }

    pub(crate) fn invalid(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            entry: entry.into(),
            reason: reason.into(),
        }
    }
}

/// Fatal document error. Parsing never returns a partial document.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Compose document is empty")]
    Empty,

    #[error("Service '{service}', field '{field}': {source}")]
    Field {
        service: String,
        field: String,
        #[source]
        source: NormalizeError,
    },

    #[error("Field '{field}': {source}")]
    TopLevel {
        field: &'static str,
        #[source]
        source: NormalizeError,
    },

    #[error("Top-level {section} '{name}', field '{field}': {source}")]
    Definition {
        section: &'static str,
        name: String,
        field: String,
        #[source]
        source: NormalizeError,
    },

    #[error("Invalid {section} name '{name}': names start with a letter or digit and contain only letters, digits, '.', '_' and '-'")]
    InvalidName { section: &'static str, name: String },

    #[error("Service '{service}': invalid port '{port}': {reason}")]
    InvalidPort {
        service: String,
        port: String,
        reason: String,
    },
}

impl ComposeError {
    pub(crate) fn field(service: &str, field: &str, source: NormalizeError) -> Self {
        Self::Field {
            service: service.to_string(),
            field: field.to_string(),
            source,
        }
    }

    /// Name of the service the error belongs to, if any
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::Field { service, .. } | Self::InvalidPort { service, .. } => Some(service),
            Self::InvalidName { section, name } if *section == "services" => Some(name),
            Self::Yaml(_)
            | Self::Empty
            | Self::TopLevel { .. }
            | Self::Definition { .. }
            | Self::InvalidName { .. } => None,
        }
    }

    /// Dotted field locator (`services.<name>.<field>`), if any
    pub fn locator(&self) -> Option<String> {
        match self {
            Self::Field { service, field, .. } => Some(format!("services.{}.{}", service, field)),
            Self::InvalidPort { service, .. } => Some(format!("services.{}.ports", service)),
            Self::Definition {
                section,
                name,
                field,
                ..
            } => Some(format!("{}.{}.{}", section, name, field)),
            Self::TopLevel { field, .. } => Some(field.to_string()),
            Self::InvalidName { section, name } => Some(format!("{}.{}", section, name)),
            Self::Yaml(_) | Self::Empty => None,
        }
    }

    /// 1-based source line for YAML syntax errors
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Yaml(err) => err.location().map(|loc| loc.line()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;
