//! Manifest generator
//!
//! Pure functions mapping one normalized compose service onto Kubernetes
//! resources. Nothing here holds state between calls; every sub-generator
//! can be used on its own.
//!
//! | Compose | Kubernetes |
//! |---------|------------|
//! | service | Deployment ([`workload`]) |
//! | `ports` | Service ([`network`]) |
//! | `environment` | ConfigMap ([`config`]) |
//! | named volume mount | PersistentVolumeClaim ([`storage`]) |
//! | top-level volume | PersistentVolume ([`storage`]) |

pub mod config;
pub mod health;
pub mod network;
pub mod ports;
pub mod storage;
pub mod workload;

use std::collections::BTreeMap;

use berth_compose::Service;
use k8s_openapi::Resource;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMap, PersistentVolume, PersistentVolumeClaim, Service as KubeService,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::error::ConversionError;
use crate::options::GeneratorOptions;

/// A generated Kubernetes resource
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Deployment(Deployment),
    Service(KubeService),
    ConfigMap(ConfigMap),
    PersistentVolumeClaim(PersistentVolumeClaim),
    PersistentVolume(PersistentVolume),
}

impl Manifest {
    /// Kubernetes kind (`Deployment`, `Service`, ...)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deployment(_) => Deployment::KIND,
            Self::Service(_) => KubeService::KIND,
            Self::ConfigMap(_) => ConfigMap::KIND,
            Self::PersistentVolumeClaim(_) => PersistentVolumeClaim::KIND,
            Self::PersistentVolume(_) => PersistentVolume::KIND,
        }
    }

    /// Resource type tag of the generated file (`deployment`, `service`, ...)
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Deployment(_) => "deployment",
            Self::Service(_) => "service",
            Self::ConfigMap(_) => "configmap",
            Self::PersistentVolumeClaim(_) => "persistentvolumeclaim",
            Self::PersistentVolume(_) => "persistentvolume",
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Deployment(r) => &r.metadata,
            Self::Service(r) => &r.metadata,
            Self::ConfigMap(r) => &r.metadata,
            Self::PersistentVolumeClaim(r) => &r.metadata,
            Self::PersistentVolume(r) => &r.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    /// Serialize to a YAML document (apiVersion and kind included)
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        match self {
            Self::Deployment(r) => serde_yaml::to_string(r),
            Self::Service(r) => serde_yaml::to_string(r),
            Self::ConfigMap(r) => serde_yaml::to_string(r),
            Self::PersistentVolumeClaim(r) => serde_yaml::to_string(r),
            Self::PersistentVolume(r) => serde_yaml::to_string(r),
        }
    }
}

/// Output of [`generate_service`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generated {
    /// Deployment first, then Service, ConfigMap and claims
    pub manifests: Vec<Manifest>,
    pub errors: Vec<ConversionError>,
}

impl Generated {
    pub fn deployment(&self) -> Option<&Deployment> {
        self.manifests.iter().find_map(|m| match m {
            Manifest::Deployment(d) => Some(d),
            _ => None,
        })
    }
}

/// Generate every resource of one service
///
/// A bad port or volume entry only drops that entry; a missing image only
/// drops the Deployment. Whatever could be generated is returned alongside
/// the errors.
pub fn generate_service(name: &str, service: &Service, options: &GeneratorOptions) -> Generated {
    let mut entry_errors = Vec::new();
    let port_mappings = ports::parse_ports(name, &service.ports, &mut entry_errors);
    let volume_plan = storage::plan(name, service, options, &mut entry_errors);

    let mut generated = Generated::default();

    match workload::deployment(name, service, &port_mappings, &volume_plan, options) {
        Ok(deployment) => generated.manifests.push(Manifest::Deployment(deployment)),
        Err(err) => generated.errors.push(err),
    }
    generated.errors.extend(entry_errors);

    if let Some(svc) = network::service(name, &port_mappings, options) {
        generated.manifests.push(Manifest::Service(svc));
    }
    if let Some(config_map) = config::config_map(name, service, options) {
        generated.manifests.push(Manifest::ConfigMap(config_map));
    }
    generated.manifests.extend(
        volume_plan
            .claims
            .into_iter()
            .map(Manifest::PersistentVolumeClaim),
    );

    for manifest in &generated.manifests {
        tracing::debug!(service = name, kind = manifest.kind(), name = manifest.name(), "generated resource");
    }
    for err in &generated.errors {
        tracing::warn!(service = name, code = %err.code, "{}", err.message);
    }

    generated
}

// =============================================================================
// Shared metadata helpers
// =============================================================================

/// Option labels plus `app=<service>`, which always wins
pub(crate) fn resource_labels(service: &str, options: &GeneratorOptions) -> BTreeMap<String, String> {
    let mut labels: BTreeMap<String, String> = options
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    labels.insert("app".to_string(), service.to_string());
    labels
}

pub(crate) fn object_meta(name: &str, service: &str, options: &GeneratorOptions) -> ObjectMeta {
    let annotations: BTreeMap<String, String> = options
        .annotations
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(options.namespace.clone()).filter(|ns| !ns.is_empty()),
        labels: Some(resource_labels(service, options)),
        annotations: (!annotations.is_empty()).then_some(annotations),
        ..Default::default()
    }
}

pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn service(yaml: &str) -> Service {
        let doc = berth_compose::parse(&format!("services:\n  svc:\n{}", yaml)).unwrap();
        doc.services["svc"].clone()
    }

    fn kinds(generated: &Generated) -> Vec<&'static str> {
        generated.manifests.iter().map(Manifest::kind).collect()
    }

    #[test]
    fn test_full_service() {
        let svc = service(
            "    image: postgres:16\n    ports: [\"5432:5432\"]\n    environment:\n      POSTGRES_DB: app\n      POSTGRES_PASSWORD: x\n    volumes: [\"pgdata:/var/lib/postgresql/data\"]\n",
        );
        let generated = generate_service("db", &svc, &GeneratorOptions::default());

        assert!(generated.errors.is_empty());
        assert_eq!(
            kinds(&generated),
            vec!["Deployment", "Service", "ConfigMap", "PersistentVolumeClaim"]
        );
        assert_eq!(generated.manifests[3].name(), "db-pgdata");
    }

    #[test]
    fn test_no_ports_no_service() {
        let svc = service("    image: busybox\n");
        let generated = generate_service("worker", &svc, &GeneratorOptions::default());
        assert_eq!(kinds(&generated), vec!["Deployment"]);
        let container = &generated.deployment().unwrap().spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0];
        assert!(container.ports.is_none());
    }

    #[test]
    fn test_missing_image_keeps_other_resources() {
        let svc = service("    build: .\n    ports: [\"80\"]\n");
        let generated = generate_service("app", &svc, &GeneratorOptions::default());
        assert_eq!(generated.errors.len(), 1);
        assert_eq!(generated.errors[0].code, ErrorCode::MissingImage);
        assert!(generated.deployment().is_none());
        assert_eq!(kinds(&generated), vec!["Service"]);
    }

    #[test]
    fn test_bad_port_dropped_once() {
        let svc = service("    image: nginx\n    ports: [\"80\", \":81\"]\n");
        let generated = generate_service("web", &svc, &GeneratorOptions::default());
        assert_eq!(generated.errors.len(), 1);
        assert_eq!(generated.errors[0].code, ErrorCode::InvalidPort);
        let Manifest::Service(kube_service) = &generated.manifests[1] else {
            panic!("expected a Service");
        };
        assert_eq!(kube_service.spec.as_ref().unwrap().ports.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_manifest_yaml_has_kind() {
        let svc = service("    image: nginx\n");
        let generated = generate_service("web", &svc, &GeneratorOptions::default());
        let yaml = generated.manifests[0].to_yaml().unwrap();
        assert!(yaml.contains("apiVersion: apps/v1"));
        assert!(yaml.contains("kind: Deployment"));
    }

    #[test]
    fn test_object_meta_omits_empty_namespace() {
        let options = GeneratorOptions::default().with_namespace("");
        let meta = object_meta("x", "x", &options);
        assert!(meta.namespace.is_none());
        assert!(meta.annotations.is_none());
    }
}
