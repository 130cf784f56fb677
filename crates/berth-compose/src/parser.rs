//! Compose document parser
//!
//! Decodes YAML into a raw document whose polymorphic fields are kept as
//! [`serde_yaml::Value`], then builds the canonical [`Document`] by running
//! every such field through the [normalizer](crate::normalize).

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{ComposeError, NormalizeError, Result};
use crate::model::{
    DEFAULT_VERSION, Deploy, Document, HealthCheck, Logging, NetworkDefinition, ResourceSpec,
    Resources, Service, VolumeDefinition,
};
use crate::normalize;

/// Compose project resource names; they end up in manifest names and file paths
static RESOURCE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").expect("valid resource name regex"));

fn check_name(section: &'static str, name: &str) -> Result<()> {
    if RESOURCE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ComposeError::InvalidName {
            section,
            name: name.to_string(),
        })
    }
}

// =============================================================================
// Raw document
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    version: Value,

    #[serde(default)]
    name: Value,

    #[serde(default)]
    services: Option<IndexMap<String, Option<RawService>>>,

    #[serde(default)]
    volumes: Option<IndexMap<String, Option<RawVolume>>>,

    #[serde(default)]
    networks: Option<IndexMap<String, Option<RawNetwork>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawService {
    image: Value,
    build: Value,
    ports: Value,
    environment: Value,
    env_file: Value,
    volumes: Value,
    networks: Value,
    depends_on: Value,
    command: Value,
    entrypoint: Value,
    working_dir: Value,
    user: Value,
    restart: Value,
    labels: Value,
    privileged: Option<bool>,
    read_only: Option<bool>,
    pid: Value,
    ipc: Value,
    shm_size: Value,
    healthcheck: Option<RawHealthCheck>,
    deploy: Option<RawDeploy>,
    logging: Option<RawLogging>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHealthCheck {
    test: Value,
    interval: Value,
    timeout: Value,
    start_period: Value,
    retries: Option<u32>,
    disable: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDeploy {
    mode: Value,
    replicas: Option<i32>,
    resources: Option<RawResources>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResources {
    limits: Option<RawResourceSpec>,
    reservations: Option<RawResourceSpec>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResourceSpec {
    cpus: Value,
    memory: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogging {
    driver: Value,
    options: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawVolume {
    driver: Value,
    driver_opts: Value,
    external: Value,
    name: Value,
    labels: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNetwork {
    driver: Value,
    external: Value,
    internal: Option<bool>,
    name: Value,
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a compose document into its canonical form
///
/// Any type mismatch in a polymorphic field, or a malformed port entry, is
/// fatal: no partial document is returned.
///
/// # Example
///
/// ```
/// let doc = berth_compose::parse("services:\n  web:\n    image: nginx\n    ports: [\"80\"]\n").unwrap();
/// assert_eq!(doc.version, "3.8");
/// assert_eq!(doc.services["web"].ports, vec!["80"]);
/// ```
pub fn parse(content: &str) -> Result<Document> {
    if content.trim().is_empty() {
        return Err(ComposeError::Empty);
    }

    let raw: Option<RawDocument> = serde_yaml::from_str(content)?;
    let raw = raw.ok_or(ComposeError::Empty)?;

    let version = normalize::optional_scalar(Some(&raw.version))
        .map_err(|source| ComposeError::TopLevel {
            field: "version",
            source,
        })?
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());
    let name = normalize::optional_scalar(Some(&raw.name)).map_err(|source| {
        ComposeError::TopLevel {
            field: "name",
            source,
        }
    })?;

    let mut services = IndexMap::new();
    for (service_name, body) in raw.services.unwrap_or_default() {
        check_name("services", &service_name)?;
        let service = build_service(&service_name, body.unwrap_or_default())?;
        validate_ports(&service_name, &service.ports)?;
        tracing::debug!(service = %service_name, "normalized service");
        services.insert(service_name, service);
    }

    let mut volumes = IndexMap::new();
    for (volume_name, body) in raw.volumes.unwrap_or_default() {
        check_name("volumes", &volume_name)?;
        let volume = build_volume(&volume_name, body.unwrap_or_default())?;
        volumes.insert(volume_name, volume);
    }

    let mut networks = IndexMap::new();
    for (network_name, body) in raw.networks.unwrap_or_default() {
        let network = build_network(&network_name, body.unwrap_or_default())?;
        networks.insert(network_name, network);
    }

    Ok(Document {
        version,
        name,
        services,
        volumes,
        networks,
    })
}

fn build_service(name: &str, raw: RawService) -> Result<Service> {
    let field = |path: &'static str| move |e: NormalizeError| ComposeError::field(name, path, e);
    let scalar = |value: &Value, path: &'static str| {
        normalize::optional_scalar(Some(value)).map_err(field(path))
    };

    let healthcheck = match raw.healthcheck {
        Some(hc) => Some(HealthCheck {
            test: normalize::healthcheck_test(&hc.test).map_err(field("healthcheck.test"))?,
            interval: scalar(&hc.interval, "healthcheck.interval")?,
            timeout: scalar(&hc.timeout, "healthcheck.timeout")?,
            start_period: scalar(&hc.start_period, "healthcheck.start_period")?,
            retries: hc.retries,
            disable: hc.disable.unwrap_or(false),
        }),
        None => None,
    };

    let deploy = match raw.deploy {
        Some(deploy) => Some(Deploy {
            mode: scalar(&deploy.mode, "deploy.mode")?,
            replicas: deploy.replicas,
            resources: match deploy.resources {
                Some(res) => Some(Resources {
                    limits: res
                        .limits
                        .map(|spec| resource_spec(spec, name, "deploy.resources.limits"))
                        .transpose()?,
                    reservations: res
                        .reservations
                        .map(|spec| resource_spec(spec, name, "deploy.resources.reservations"))
                        .transpose()?,
                }),
                None => None,
            },
        }),
        None => None,
    };

    let logging = match raw.logging {
        Some(logging) => Some(Logging {
            driver: scalar(&logging.driver, "logging.driver")?,
            options: normalize::environment(&logging.options).map_err(field("logging.options"))?,
        }),
        None => None,
    };

    Ok(Service {
        image: scalar(&raw.image, "image")?,
        build: normalize::build(&raw.build).map_err(field("build"))?,
        ports: normalize::ports(&raw.ports).map_err(field("ports"))?,
        environment: normalize::environment(&raw.environment).map_err(field("environment"))?,
        env_files: normalize::env_files(&raw.env_file).map_err(field("env_file"))?,
        volumes: normalize::volumes(&raw.volumes).map_err(field("volumes"))?,
        networks: normalize::networks(&raw.networks).map_err(field("networks"))?,
        depends_on: normalize::depends_on(&raw.depends_on).map_err(field("depends_on"))?,
        command: normalize::command(&raw.command).map_err(field("command"))?,
        entrypoint: normalize::command(&raw.entrypoint).map_err(field("entrypoint"))?,
        working_dir: scalar(&raw.working_dir, "working_dir")?,
        user: scalar(&raw.user, "user")?,
        restart: scalar(&raw.restart, "restart")?,
        labels: normalize::environment(&raw.labels).map_err(field("labels"))?,
        privileged: raw.privileged.unwrap_or(false),
        read_only: raw.read_only.unwrap_or(false),
        pid: scalar(&raw.pid, "pid")?,
        ipc: scalar(&raw.ipc, "ipc")?,
        shm_size: scalar(&raw.shm_size, "shm_size")?,
        healthcheck,
        deploy,
        logging,
    })
}

fn resource_spec(raw: RawResourceSpec, service: &str, field: &str) -> Result<ResourceSpec> {
    let scalar = |value: &Value, suffix: &str| {
        normalize::optional_scalar(Some(value))
            .map_err(|e| ComposeError::field(service, &format!("{}.{}", field, suffix), e))
    };
    Ok(ResourceSpec {
        cpus: scalar(&raw.cpus, "cpus")?,
        memory: scalar(&raw.memory, "memory")?,
    })
}

fn build_volume(name: &str, raw: RawVolume) -> Result<VolumeDefinition> {
    let err = |field: &str| {
        let field = field.to_string();
        move |source: NormalizeError| ComposeError::Definition {
            section: "volumes",
            name: name.to_string(),
            field,
            source,
        }
    };

    Ok(VolumeDefinition {
        driver: normalize::optional_scalar(Some(&raw.driver))
            .map_err(err("driver"))?
            .unwrap_or_default(),
        driver_opts: normalize::environment(&raw.driver_opts).map_err(err("driver_opts"))?,
        external: normalize::external(Some(&raw.external)).map_err(err("external"))?,
        name: normalize::optional_scalar(Some(&raw.name)).map_err(err("name"))?,
        labels: normalize::environment(&raw.labels).map_err(err("labels"))?,
    })
}

fn build_network(name: &str, raw: RawNetwork) -> Result<NetworkDefinition> {
    let err = |field: &str| {
        let field = field.to_string();
        move |source: NormalizeError| ComposeError::Definition {
            section: "networks",
            name: name.to_string(),
            field,
            source,
        }
    };

    Ok(NetworkDefinition {
        driver: normalize::optional_scalar(Some(&raw.driver))
            .map_err(err("driver"))?
            .unwrap_or_default(),
        external: normalize::external(Some(&raw.external)).map_err(err("external"))?,
        internal: raw.internal.unwrap_or(false),
        name: normalize::optional_scalar(Some(&raw.name)).map_err(err("name"))?,
    })
}

// =============================================================================
// Port validation
// =============================================================================

fn validate_ports(service: &str, ports: &[String]) -> Result<()> {
    for port in ports {
        validate_port(port).map_err(|reason| ComposeError::InvalidPort {
            service: service.to_string(),
            port: port.clone(),
            reason,
        })?;
    }
    Ok(())
}

/// Check a short-syntax port entry
///
/// Empty segments are let through; they surface later as per-port
/// generation errors.
pub fn validate_port(entry: &str) -> std::result::Result<(), String> {
    let numeric = |segment: &str| -> std::result::Result<(), String> {
        if segment.is_empty() || segment.parse::<i64>().is_ok() {
            Ok(())
        } else {
            Err(format!("'{}' is not a port number", segment))
        }
    };

    let segments: Vec<&str> = entry.split(':').collect();
    match segments.as_slice() {
        [port] => port
            .parse::<i64>()
            .map(|_| ())
            .map_err(|_| format!("'{}' is not a port number", port)),
        [host, container] => {
            numeric(host)?;
            numeric(container)
        }
        [first, second, third] => {
            if third.eq_ignore_ascii_case("tcp") || third.eq_ignore_ascii_case("udp") {
                numeric(first)?;
                numeric(second)
            } else {
                numeric(second)?;
                numeric(third)
            }
        }
        _ => Err(format!(
            "expected 1 to 3 colon-separated segments, found {}",
            segments.len()
        )),
    }
}
