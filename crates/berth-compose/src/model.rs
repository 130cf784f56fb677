//! Canonical compose model
//!
//! Every polymorphic source field has already been normalized by the time a
//! value of these types exists, so consumers never branch on source shape.

use indexmap::IndexMap;

/// Version assumed when a document does not declare one
pub const DEFAULT_VERSION: &str = "3.8";

/// A parsed and normalized compose document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Schema version tag (defaulted when absent)
    pub version: String,

    /// Project name
    pub name: Option<String>,

    /// Services in declaration order
    pub services: IndexMap<String, Service>,

    /// Top-level named volumes
    pub volumes: IndexMap<String, VolumeDefinition>,

    /// Top-level named networks
    pub networks: IndexMap<String, NetworkDefinition>,
}

/// One workload definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Service {
    pub image: Option<String>,
    pub build: Option<BuildSpec>,

    /// Port mappings in short syntax (`"80"`, `"8080:80"`, `"8080:80:udp"`, `"127.0.0.1:8080:80"`)
    pub ports: Vec<String>,

    /// Environment variables, name → value
    pub environment: IndexMap<String, String>,

    /// Env files referenced by the service (not inlined)
    pub env_files: Vec<String>,

    /// Volume mounts in short syntax (`"./src:/app:ro"`, `"data:/var/lib/db"`, `"/tmp"`)
    pub volumes: Vec<String>,

    /// Network membership, name → attachment config
    pub networks: IndexMap<String, NetworkAttachment>,

    /// Dependency edges, name → condition (empty when unspecified)
    pub depends_on: IndexMap<String, String>,

    pub command: Vec<String>,
    pub entrypoint: Vec<String>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub restart: Option<String>,

    /// Container labels
    pub labels: IndexMap<String, String>,

    pub privileged: bool,
    pub read_only: bool,
    pub pid: Option<String>,
    pub ipc: Option<String>,
    pub shm_size: Option<String>,

    pub healthcheck: Option<HealthCheck>,
    pub deploy: Option<Deploy>,
    pub logging: Option<Logging>,
}

impl Service {
    /// Image reference, treating an empty string as absent
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.trim().is_empty())
    }

    /// Resource limits/reservations declared under `deploy`
    pub fn resources(&self) -> Option<&Resources> {
        self.deploy.as_ref().and_then(|deploy| deploy.resources.as_ref())
    }
}

/// Build configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildSpec {
    pub context: Option<String>,
    pub dockerfile: Option<String>,
    pub target: Option<String>,
    pub args: IndexMap<String, String>,
}

/// Per-network attachment settings of a service
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkAttachment {
    pub aliases: Vec<String>,
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
}

/// Container health check
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HealthCheck {
    /// Test command; the string form is stored as `["CMD-SHELL", <command>]`
    pub test: Vec<String>,
    pub interval: Option<String>,
    pub timeout: Option<String>,
    pub start_period: Option<String>,
    pub retries: Option<u32>,
    pub disable: bool,
}

/// Deployment settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deploy {
    pub mode: Option<String>,
    pub replicas: Option<i32>,
    pub resources: Option<Resources>,
}

/// Resource constraints
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resources {
    pub limits: Option<ResourceSpec>,
    pub reservations: Option<ResourceSpec>,
}

/// CPU and memory amounts, as written in the source document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceSpec {
    pub cpus: Option<String>,
    pub memory: Option<String>,
}

impl ResourceSpec {
    pub fn is_empty(&self) -> bool {
        self.cpus.is_none() && self.memory.is_none()
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Logging {
    pub driver: Option<String>,
    pub options: IndexMap<String, String>,
}

/// Top-level named volume
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeDefinition {
    /// Volume driver; empty means the default local driver
    pub driver: String,
    pub driver_opts: IndexMap<String, String>,
    pub external: bool,
    pub name: Option<String>,
    pub labels: IndexMap<String, String>,
}

impl VolumeDefinition {
    /// Whether the volume uses the local driver
    pub fn is_local(&self) -> bool {
        self.driver.is_empty() || self.driver == "local"
    }
}

/// Top-level named network
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkDefinition {
    pub driver: String,
    pub external: bool,
    pub internal: bool,
    pub name: Option<String>,
}
