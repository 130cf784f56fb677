//! Volume mounts, claims and top-level volumes
//!
//! Every volume entry of a service at position `i` becomes a pod volume and
//! a mount both named `volume-<i>`:
//!
//! | Entry | Pod volume source | Extra resource |
//! |-------|-------------------|----------------|
//! | `./src:/app`, `/var/run/docker.sock:/var/run/docker.sock`, `~/x:/x` | hostPath | - |
//! | `data:/var/lib/data` | persistentVolumeClaim `<service>-data` | PVC |
//! | `/tmp/cache` | emptyDir | - |

use std::collections::{BTreeMap, HashSet};

use berth_compose::{Service, VolumeDefinition};
use k8s_openapi::api::core::v1::{
    EmptyDirVolumeSource, HostPathVolumeSource, PersistentVolume, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PersistentVolumeSpec, Volume,
    VolumeMount, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use super::object_meta;
use crate::error::{ConversionError, errors};
use crate::options::GeneratorOptions;

/// Capacity given to every generated claim and volume
pub const DEFAULT_CAPACITY: &str = "1Gi";

const ACCESS_MODE: &str = "ReadWriteOnce";

/// Root of the host paths backing top-level volumes
pub const HOST_DATA_ROOT: &str = "/mnt/data";

const MOUNT_OPTIONS: [&str; 8] = [
    "ro",
    "rw",
    "z",
    "Z",
    "cached",
    "delegated",
    "consistent",
    "nocopy",
];

/// Where a mounted volume comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSource {
    /// Host directory or file
    Bind(String),
    /// Top-level named volume
    Named(String),
    /// Anonymous, scratch volume
    Anonymous,
}

/// A parsed short-syntax volume entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeEntry {
    pub source: VolumeSource,
    pub target: String,
    pub read_only: bool,
}

/// Pod volumes, mounts and claims derived from a service's volume entries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumePlan {
    pub volumes: Vec<Volume>,
    pub mounts: Vec<VolumeMount>,
    pub claims: Vec<PersistentVolumeClaim>,
}

fn is_bind_path(source: &str) -> bool {
    source.starts_with('/') || source.starts_with('.') || source.starts_with('~')
}

/// Parse one short-syntax volume entry
pub fn parse_volume(entry: &str) -> Result<VolumeEntry, String> {
    let segments: Vec<&str> = entry.split(':').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err("empty segment".to_string());
    }

    let (source, target, mode) = match segments.as_slice() {
        [target] => (None, *target, None),
        [source, target] => (Some(*source), *target, None),
        [source, target, mode] => (Some(*source), *target, Some(*mode)),
        _ => {
            return Err(format!(
                "expected 1 to 3 colon-separated segments, found {}",
                segments.len()
            ));
        }
    };

    if !target.starts_with('/') {
        return Err(format!("container path '{}' is not absolute", target));
    }

    let mut read_only = false;
    if let Some(mode) = mode {
        for option in mode.split(',') {
            if !MOUNT_OPTIONS.contains(&option) {
                return Err(format!("unknown mode '{}'", option));
            }
            read_only |= option == "ro";
        }
    }

    let source = match source {
        None => VolumeSource::Anonymous,
        Some(path) if is_bind_path(path) => VolumeSource::Bind(path.to_string()),
        Some(name) => VolumeSource::Named(name.to_string()),
    };

    Ok(VolumeEntry {
        source,
        target: target.to_string(),
        read_only,
    })
}

/// Claim name of a named volume mounted by a service
pub fn claim_name(service: &str, volume: &str) -> String {
    format!("{}-{}", service, volume)
}

/// Build the pod volumes, mounts and claims of a service
///
/// A malformed entry is reported and skipped, but still consumes its index
/// so the names of the following entries do not shift.
pub fn plan(
    name: &str,
    service: &Service,
    options: &GeneratorOptions,
    errors: &mut Vec<ConversionError>,
) -> VolumePlan {
    let mut plan = VolumePlan::default();
    let mut claimed = HashSet::new();

    for (index, raw) in service.volumes.iter().enumerate() {
        let entry = match parse_volume(raw) {
            Ok(entry) => entry,
            Err(reason) => {
                errors.push(errors::invalid_volume(name, raw, &reason));
                continue;
            }
        };

        let volume_name = format!("volume-{}", index);
        let mut volume = Volume {
            name: volume_name.clone(),
            ..Default::default()
        };

        match &entry.source {
            VolumeSource::Bind(path) => {
                volume.host_path = Some(HostPathVolumeSource {
                    path: path.clone(),
                    ..Default::default()
                });
            }
            VolumeSource::Named(volume_ref) => {
                let claim = claim_name(name, volume_ref);
                volume.persistent_volume_claim = Some(PersistentVolumeClaimVolumeSource {
                    claim_name: claim.clone(),
                    read_only: entry.read_only.then_some(true),
                });
                if claimed.insert(claim.clone()) {
                    plan.claims.push(persistent_volume_claim(&claim, name, options));
                }
            }
            VolumeSource::Anonymous => {
                volume.empty_dir = Some(EmptyDirVolumeSource::default());
            }
        }

        plan.volumes.push(volume);
        plan.mounts.push(VolumeMount {
            name: volume_name,
            mount_path: entry.target,
            read_only: entry.read_only.then_some(true),
            ..Default::default()
        });
    }

    plan
}

fn capacity() -> BTreeMap<String, Quantity> {
    BTreeMap::from([(
        "storage".to_string(),
        Quantity(DEFAULT_CAPACITY.to_string()),
    )])
}

/// Claim backing a named volume of a service
pub fn persistent_volume_claim(
    claim: &str,
    service: &str,
    options: &GeneratorOptions,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: object_meta(claim, service, options),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![ACCESS_MODE.to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(capacity()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// PersistentVolume for a top-level named volume
///
/// Only the local driver can be expressed as a hostPath volume; any other
/// driver is an error for that volume alone.
pub fn persistent_volume(
    name: &str,
    definition: &VolumeDefinition,
    options: &GeneratorOptions,
) -> Result<PersistentVolume, ConversionError> {
    if !definition.is_local() {
        return Err(errors::unsupported_volume_driver(name, &definition.driver));
    }

    let mut labels: BTreeMap<String, String> = options
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    labels.extend(definition.labels.iter().map(|(k, v)| (k.clone(), v.clone())));

    Ok(PersistentVolume {
        // cluster-scoped: no namespace
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: non_empty_map(labels),
            annotations: non_empty_map(
                options
                    .annotations
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            ..Default::default()
        },
        spec: Some(PersistentVolumeSpec {
            capacity: Some(capacity()),
            access_modes: Some(vec![ACCESS_MODE.to_string()]),
            persistent_volume_reclaim_policy: Some("Retain".to_string()),
            host_path: Some(HostPathVolumeSource {
                path: format!("{}/{}", HOST_DATA_ROOT, name),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn non_empty_map(map: BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    (!map.is_empty()).then_some(map)
}
