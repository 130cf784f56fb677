//! Error and warning types for the converter
//!
//! Fatal problems surface as [`ConvertError`] from the fallible entry points.
//! Everything discovered while generating manifests is collected instead:
//! [`ConversionError`]s make a result unsuccessful, [`ConversionWarning`]s
//! only advise.

use berth_compose::ComposeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Converter error
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("Converter already registered: {0}")]
    DuplicateConverter(String),

    #[error("Converter registry lock poisoned")]
    RegistryPoisoned,
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Machine-readable code of a collected conversion error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ParseError,
    UnsupportedType,
    MissingImage,
    InvalidPort,
    InvalidVolume,
    UnsupportedVolumeDriver,
    DuplicateResource,
    YamlMarshalError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseError => "PARSE_ERROR",
            Self::UnsupportedType => "UNSUPPORTED_TYPE",
            Self::MissingImage => "MISSING_IMAGE",
            Self::InvalidPort => "INVALID_PORT",
            Self::InvalidVolume => "INVALID_VOLUME",
            Self::UnsupportedVolumeDriver => "UNSUPPORTED_VOLUME_DRIVER",
            Self::DuplicateResource => "DUPLICATE_RESOURCE",
            Self::YamlMarshalError => "YAML_MARSHAL_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable code of an advisory warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    UnsupportedNetworks,
    UnsupportedDependsOn,
    UnsupportedPidMode,
    UnsupportedIpcMode,
    UnsupportedShmSize,
    UnsupportedRestartPolicy,
    UnsupportedEnvFile,
    UnsupportedLogging,
    UnsupportedDeployMode,
    InvalidHealthcheckDuration,
    SecretInEnvironment,
    ExternalVolume,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedNetworks => "UNSUPPORTED_NETWORKS",
            Self::UnsupportedDependsOn => "UNSUPPORTED_DEPENDS_ON",
            Self::UnsupportedPidMode => "UNSUPPORTED_PID_MODE",
            Self::UnsupportedIpcMode => "UNSUPPORTED_IPC_MODE",
            Self::UnsupportedShmSize => "UNSUPPORTED_SHM_SIZE",
            Self::UnsupportedRestartPolicy => "UNSUPPORTED_RESTART_POLICY",
            Self::UnsupportedEnvFile => "UNSUPPORTED_ENV_FILE",
            Self::UnsupportedLogging => "UNSUPPORTED_LOGGING",
            Self::UnsupportedDeployMode => "UNSUPPORTED_DEPLOY_MODE",
            Self::InvalidHealthcheckDuration => "INVALID_HEALTHCHECK_DURATION",
            Self::SecretInEnvironment => "SECRET_IN_ENVIRONMENT",
            Self::ExternalVolume => "EXTERNAL_VOLUME",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONVERSION ERRORS
// =============================================================================

/// A problem that prevented one resource from being generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionError {
    pub code: ErrorCode,
    pub message: String,
    /// Dotted field locator (`services.web.ports`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ConversionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            line: None,
            suggestion: None,
        }
    }

    /// Add a field locator
    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add line number
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Add suggestion
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [CODE] field:line - message
        write!(f, "[{}]", self.code)?;

        if let Some(ref field) = self.field {
            write!(f, " {}", field)?;
        }

        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }

        write!(f, " - {}", self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  → {}", suggestion)?;
        }

        Ok(())
    }
}

// =============================================================================
// WARNING SYSTEM
// =============================================================================

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningSeverity {
    /// Converted, but the result differs in a way worth knowing
    Info,
    /// Converted, manual review recommended
    Warning,
    /// Feature dropped, alternative provided
    Unsupported,
}

impl WarningSeverity {
    /// Get the display color for terminal output
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "cyan",
            Self::Warning => "yellow",
            Self::Unsupported => "magenta",
        }
    }

    /// Get the icon for this severity
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Warning => "⚠",
            Self::Unsupported => "✗",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Warning category for grouping related warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningCategory {
    /// Service discovery and network topology
    Networking,
    /// Start order, placement and restart behaviour
    Scheduling,
    /// Container runtime namespaces and devices
    Runtime,
    /// Volumes and storage drivers
    Storage,
    /// Credentials and privileges
    Security,
    /// Logging and health checks
    Observability,
}

impl WarningCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Networking => "networking",
            Self::Scheduling => "scheduling",
            Self::Runtime => "runtime",
            Self::Storage => "storage",
            Self::Security => "security",
            Self::Observability => "observability",
        }
    }
}

/// Advisory warning with context and alternatives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionWarning {
    pub code: WarningCode,
    pub severity: WarningSeverity,
    pub category: WarningCategory,
    pub message: String,
    /// Dotted field locator (`services.web.networks`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Suggested alternative or fix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ConversionWarning {
    /// Create a warning-level warning
    pub fn warning(code: WarningCode, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: WarningSeverity::Warning,
            category,
            message: message.into(),
            field: None,
            suggestion: None,
        }
    }

    /// Create an unsupported feature warning
    pub fn unsupported(
        code: WarningCode,
        category: WarningCategory,
        message: impl Into<String>,
        alternative: &str,
    ) -> Self {
        Self {
            severity: WarningSeverity::Unsupported,
            suggestion: Some(alternative.to_string()),
            ..Self::warning(code, category, message)
        }
    }

    /// Create an info-level warning
    pub fn info(code: WarningCode, category: WarningCategory, message: impl Into<String>) -> Self {
        Self {
            severity: WarningSeverity::Info,
            ..Self::warning(code, category, message)
        }
    }

    /// Add a field locator
    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add suggestion to warning
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl std::fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [severity] field - message
        write!(f, "[{}]", self.severity.label())?;

        if let Some(ref field) = self.field {
            write!(f, " {}", field)?;
        }

        write!(f, " - {}", self.message)?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  {} {}", self.severity.icon(), suggestion)?;
        }

        Ok(())
    }
}

// =============================================================================
// PREDEFINED ERRORS
// =============================================================================

/// Factory functions for collected errors
pub mod errors {
    use super::*;

    /// Fatal document error, reported as the only error of a result
    pub fn parse_error(err: &ComposeError) -> ConversionError {
        let mut error = ConversionError::new(
            ErrorCode::ParseError,
            format!("Failed to parse compose document: {}", err),
        );
        if let Some(field) = err.locator() {
            error = error.at_field(field);
        }
        if let Some(line) = err.line() {
            error = error.at_line(line);
        }
        error
    }

    pub fn unsupported_type(content_type: &str, known: &[String]) -> ConversionError {
        ConversionError::new(
            ErrorCode::UnsupportedType,
            format!("No converter registered for content type '{}'", content_type),
        )
        .with_suggestion(&format!("Supported types: {}", known.join(", ")))
    }

    pub fn missing_image(service: &str, has_build: bool) -> ConversionError {
        let error = ConversionError::new(
            ErrorCode::MissingImage,
            format!("Service '{}' has no image", service),
        )
        .at_field(format!("services.{}.image", service));

        if has_build {
            error.with_suggestion(
                "Build the image, push it to a registry, and set 'image' to its reference",
            )
        } else {
            error.with_suggestion("Set 'image' to the container image to run")
        }
    }

    pub fn invalid_port(service: &str, port: &str, reason: &str) -> ConversionError {
        ConversionError::new(
            ErrorCode::InvalidPort,
            format!("Invalid port '{}' for service '{}': {}", port, service, reason),
        )
        .at_field(format!("services.{}.ports", service))
    }

    pub fn invalid_volume(service: &str, volume: &str, reason: &str) -> ConversionError {
        ConversionError::new(
            ErrorCode::InvalidVolume,
            format!(
                "Invalid volume '{}' for service '{}': {}",
                volume, service, reason
            ),
        )
        .at_field(format!("services.{}.volumes", service))
    }

    pub fn unsupported_volume_driver(volume: &str, driver: &str) -> ConversionError {
        ConversionError::new(
            ErrorCode::UnsupportedVolumeDriver,
            format!(
                "Volume driver '{}' is not supported for volume '{}'",
                driver, volume
            ),
        )
        .at_field(format!("volumes.{}.driver", volume))
        .with_suggestion("Create a StorageClass for this backend and reference it from a PersistentVolumeClaim")
    }

    /// A claim name already taken by an earlier service in the same document
    pub fn duplicate_claim(service: &str, claim: &str, owner: &str) -> ConversionError {
        ConversionError::new(
            ErrorCode::DuplicateResource,
            format!(
                "PersistentVolumeClaim '{}' of service '{}' clashes with the claim of service '{}'",
                claim, service, owner
            ),
        )
        .at_field(format!("services.{}.volumes", service))
        .with_suggestion("Rename the service or the volume so '<service>-<volume>' is unique")
    }

    pub fn internal(err: &ConvertError) -> ConversionError {
        ConversionError::new(ErrorCode::InternalError, err.to_string())
    }

    pub fn yaml_marshal(resource: &str, err: &serde_yaml::Error) -> ConversionError {
        ConversionError::new(
            ErrorCode::YamlMarshalError,
            format!("Failed to marshal {}: {}", resource, err),
        )
    }
}

// =============================================================================
// PREDEFINED WARNINGS
// =============================================================================

/// Factory functions for advisory warnings
pub mod warnings {
    use super::*;

    pub fn custom_networks(service: &str, networks: &[&str]) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedNetworks,
            WarningCategory::Networking,
            format!(
                "Custom networks ({}) for service '{}' will be converted to default Kubernetes networking",
                networks.join(", "),
                service
            ),
            "Use NetworkPolicies to restrict traffic between pods",
        )
        .at_field(format!("services.{}.networks", service))
    }

    pub fn depends_on(service: &str, deps: &[&str]) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedDependsOn,
            WarningCategory::Scheduling,
            format!(
                "Dependencies of service '{}' ({}) are not directly supported in Kubernetes",
                service,
                deps.join(", ")
            ),
            "Consider using init containers or readiness probes",
        )
        .at_field(format!("services.{}.depends_on", service))
    }

    pub fn pid_mode(service: &str, mode: &str) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedPidMode,
            WarningCategory::Runtime,
            format!("PID mode '{}' for service '{}' is not supported", mode, service),
            "Use 'shareProcessNamespace: true' on the pod spec to share a PID namespace between containers",
        )
        .at_field(format!("services.{}.pid", service))
    }

    pub fn ipc_mode(service: &str, mode: &str) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedIpcMode,
            WarningCategory::Runtime,
            format!("IPC mode '{}' for service '{}' is not supported", mode, service),
            "Containers of the same pod already share an IPC namespace",
        )
        .at_field(format!("services.{}.ipc", service))
    }

    pub fn shm_size(service: &str, size: &str) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedShmSize,
            WarningCategory::Runtime,
            format!(
                "SHM size '{}' for service '{}' requires manual setup in Kubernetes",
                size, service
            ),
            "Mount an emptyDir volume with 'medium: Memory' and a sizeLimit at /dev/shm",
        )
        .at_field(format!("services.{}.shm_size", service))
    }

    pub fn restart_policy(service: &str, policy: &str) -> ConversionWarning {
        ConversionWarning::warning(
            WarningCode::UnsupportedRestartPolicy,
            WarningCategory::Scheduling,
            format!(
                "Restart policy '{}' for service '{}' cannot be expressed by a Deployment, which always restarts",
                policy, service
            ),
        )
        .with_suggestion("Use a Job for run-to-completion workloads")
        .at_field(format!("services.{}.restart", service))
    }

    pub fn env_file(service: &str, files: &[String]) -> ConversionWarning {
        ConversionWarning::warning(
            WarningCode::UnsupportedEnvFile,
            WarningCategory::Runtime,
            format!(
                "Env files of service '{}' ({}) are not inlined into the generated manifests",
                service,
                files.join(", ")
            ),
        )
        .with_suggestion("Create a ConfigMap or Secret from the file and reference it with 'envFrom'")
        .at_field(format!("services.{}.env_file", service))
    }

    pub fn logging(service: &str, driver: &str) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedLogging,
            WarningCategory::Observability,
            format!(
                "Logging driver '{}' for service '{}' is not supported",
                driver, service
            ),
            "Container logs go to stdout/stderr; ship them with a cluster-level log collector",
        )
        .at_field(format!("services.{}.logging", service))
    }

    pub fn deploy_mode(service: &str, mode: &str) -> ConversionWarning {
        ConversionWarning::unsupported(
            WarningCode::UnsupportedDeployMode,
            WarningCategory::Scheduling,
            format!(
                "Deploy mode '{}' for service '{}' was converted to a Deployment",
                mode, service
            ),
            "Use a DaemonSet to run one pod per node",
        )
        .at_field(format!("services.{}.deploy.mode", service))
    }

    pub fn healthcheck_duration(service: &str, field: &str, value: &str) -> ConversionWarning {
        ConversionWarning::warning(
            WarningCode::InvalidHealthcheckDuration,
            WarningCategory::Observability,
            format!(
                "Health check {} '{}' for service '{}' could not be converted and was ignored",
                field, value, service
            ),
        )
        .with_suggestion("Use a whole number of seconds, minutes or hours, such as '30s' or '1m'")
        .at_field(format!("services.{}.healthcheck.{}", service, field))
    }

    pub fn secret_in_environment(service: &str, names: &[&str]) -> ConversionWarning {
        ConversionWarning::warning(
            WarningCode::SecretInEnvironment,
            WarningCategory::Security,
            format!(
                "Secret-like variables of service '{}' ({}) stay inline in the Deployment",
                service,
                names.join(", ")
            ),
        )
        .with_suggestion("Move them to a Secret and reference it with 'valueFrom.secretKeyRef'")
        .at_field(format!("services.{}.environment", service))
    }

    pub fn external_volume(volume: &str) -> ConversionWarning {
        ConversionWarning::info(
            WarningCode::ExternalVolume,
            WarningCategory::Storage,
            format!(
                "Volume '{}' is external; no PersistentVolume was generated",
                volume
            ),
        )
        .at_field(format!("volumes.{}", volume))
    }
}
