//! Deployment generation

use std::collections::BTreeMap;

use berth_compose::{ResourceSpec, Service};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PodSpec, PodTemplateSpec, ResourceRequirements, SecurityContext,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use once_cell::sync::Lazy;
use regex::Regex;

use super::health;
use super::ports::{self, PortMapping};
use super::storage::VolumePlan;
use super::{non_empty, object_meta, resource_labels};
use crate::error::{ConversionError, errors};
use crate::options::GeneratorOptions;

static MEMORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*([bkmg])b?$").expect("valid memory regex")
});

/// Generate the Deployment of a service
///
/// Fails only when the service has no image. Ports and volumes are taken
/// already parsed, so their per-entry errors are reported once by the caller.
pub fn deployment(
    name: &str,
    service: &Service,
    ports: &[PortMapping],
    storage: &VolumePlan,
    options: &GeneratorOptions,
) -> Result<Deployment, ConversionError> {
    let image = service
        .image()
        .ok_or_else(|| errors::missing_image(name, service.build.is_some()))?;

    let replicas = options
        .replicas
        .or_else(|| service.deploy.as_ref().and_then(|d| d.replicas))
        .unwrap_or(1);

    let (liveness, readiness) = match service.healthcheck.as_ref().and_then(health::probes) {
        Some((liveness, readiness)) => (Some(liveness), Some(readiness)),
        None => (None, None),
    };

    let container = Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(options.image_pull_policy.to_string()),
        command: non_empty(service.command.clone()),
        args: non_empty(service.entrypoint.clone()),
        working_dir: service.working_dir.clone().filter(|dir| !dir.is_empty()),
        ports: non_empty(ports::container_ports(ports)),
        env: non_empty(env_vars(service)),
        liveness_probe: liveness,
        readiness_probe: readiness,
        resources: resources(service),
        security_context: security_context(service),
        volume_mounts: non_empty(storage.mounts.clone()),
        ..Default::default()
    };

    let pod_annotations: BTreeMap<String, String> = service
        .labels
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Deployment {
        metadata: object_meta(name, name, options),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(BTreeMap::from([("app".to_string(), name.to_string())])),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(resource_labels(name, options)),
                    annotations: (!pod_annotations.is_empty()).then_some(pod_annotations),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    volumes: non_empty(storage.volumes.clone()),
                    restart_policy: Some("Always".to_string()),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// One env var per declared variable, secret-like or not
fn env_vars(service: &Service) -> Vec<EnvVar> {
    service
        .environment
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..Default::default()
        })
        .collect()
}

// =============================================================================
// Resources
// =============================================================================

/// Convert a compose memory amount to a Kubernetes quantity
///
/// `512m` → `512Mi`, `1g`/`1gb` → `1Gi`, `100k` → `100Ki`, `1024b` → `1024`.
/// Values that do not match are passed through unchanged.
pub fn memory_quantity(value: &str) -> String {
    let value = value.trim();
    let Some(caps) = MEMORY.captures(value) else {
        return value.to_string();
    };
    let amount = &caps[1];
    match caps[2].to_ascii_lowercase().as_str() {
        "k" => format!("{}Ki", amount),
        "m" => format!("{}Mi", amount),
        "g" => format!("{}Gi", amount),
        _ => amount.to_string(),
    }
}

fn quantities(spec: Option<&ResourceSpec>) -> Option<BTreeMap<String, Quantity>> {
    let spec = spec.filter(|s| !s.is_empty())?;
    let mut map = BTreeMap::new();
    if let Some(cpus) = spec.cpus.as_deref().filter(|c| !c.is_empty()) {
        map.insert("cpu".to_string(), Quantity(cpus.to_string()));
    }
    if let Some(memory) = spec.memory.as_deref().filter(|m| !m.is_empty()) {
        map.insert("memory".to_string(), Quantity(memory_quantity(memory)));
    }
    (!map.is_empty()).then_some(map)
}

/// Limits map to `limits`, reservations to `requests`
pub fn resources(service: &Service) -> Option<ResourceRequirements> {
    let res = service.resources()?;
    let limits = quantities(res.limits.as_ref());
    let requests = quantities(res.reservations.as_ref());

    if limits.is_none() && requests.is_none() {
        return None;
    }

    Some(ResourceRequirements {
        limits,
        requests,
        ..Default::default()
    })
}

// =============================================================================
// Security context
// =============================================================================

/// Numeric `user` / `uid:gid`, privileged and read-only root
pub fn security_context(service: &Service) -> Option<SecurityContext> {
    let (run_as_user, run_as_group) = match service.user.as_deref() {
        Some(user) => match user.split_once(':') {
            Some((uid, gid)) => (uid.parse::<i64>().ok(), gid.parse::<i64>().ok()),
            None => (user.parse::<i64>().ok(), None),
        },
        None => (None, None),
    };
    // a group without a numeric user is dropped with it
    let run_as_group = run_as_user.and(run_as_group);

    let context = SecurityContext {
        run_as_user,
        run_as_group,
        privileged: service.privileged.then_some(true),
        read_only_root_filesystem: service.read_only.then_some(true),
        ..Default::default()
    };

    (context != SecurityContext::default()).then_some(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_compose::{Deploy, HealthCheck, Resources};
    use indexmap::IndexMap;

    fn service(image: &str) -> Service {
        Service {
            image: Some(image.to_string()),
            ..Default::default()
        }
    }

    fn generate(name: &str, service: &Service, options: &GeneratorOptions) -> Deployment {
        deployment(name, service, &[], &VolumePlan::default(), options).unwrap()
    }

    fn container(deployment: &Deployment) -> &Container {
        &deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap().containers[0]
    }

    #[test]
    fn test_missing_image() {
        let err = deployment("app", &Service::default(), &[], &VolumePlan::default(), &GeneratorOptions::default())
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::MissingImage);
        assert!(err.message.contains("'app'"));
    }

    #[test]
    fn test_empty_image_is_missing() {
        let svc = service("  ");
        assert!(deployment("app", &svc, &[], &VolumePlan::default(), &GeneratorOptions::default()).is_err());
    }

    #[test]
    fn test_basic_deployment() {
        let deployment = generate("web", &service("nginx:1.25"), &GeneratorOptions::default());
        let meta = &deployment.metadata;
        assert_eq!(meta.name.as_deref(), Some("web"));
        assert_eq!(meta.namespace.as_deref(), Some("default"));
        assert_eq!(meta.labels.as_ref().unwrap()["app"], "web");

        let spec = deployment.spec.as_ref().unwrap();
        assert_eq!(spec.replicas, Some(1));
        assert_eq!(spec.selector.match_labels.as_ref().unwrap()["app"], "web");
        let pod = spec.template.spec.as_ref().unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some("Always"));
        assert!(pod.volumes.is_none());

        let c = container(&deployment);
        assert_eq!(c.name, "web");
        assert_eq!(c.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(c.image_pull_policy.as_deref(), Some("IfNotPresent"));
        assert!(c.ports.is_none());
        assert!(c.env.is_none());
        assert!(c.resources.is_none());
        assert!(c.security_context.is_none());
    }

    #[test]
    fn test_replicas_precedence() {
        let mut svc = service("nginx");
        svc.deploy = Some(Deploy {
            replicas: Some(4),
            ..Default::default()
        });

        let from_deploy = generate("web", &svc, &GeneratorOptions::default());
        assert_eq!(from_deploy.spec.unwrap().replicas, Some(4));

        let from_options = generate("web", &svc, &GeneratorOptions::default().with_replicas(2));
        assert_eq!(from_options.spec.unwrap().replicas, Some(2));
    }

    #[test]
    fn test_app_label_wins() {
        let options = GeneratorOptions::default()
            .with_label("app", "other")
            .with_label("team", "core")
            .with_annotation("owner", "ops");
        let deployment = generate("web", &service("nginx"), &options);
        let labels = deployment.metadata.labels.as_ref().unwrap();
        assert_eq!(labels["app"], "web");
        assert_eq!(labels["team"], "core");
        assert_eq!(deployment.metadata.annotations.as_ref().unwrap()["owner"], "ops");
    }

    #[test]
    fn test_compose_labels_become_pod_annotations() {
        let mut svc = service("nginx");
        svc.labels = IndexMap::from([("traefik.enable".to_string(), "true".to_string())]);
        let deployment = generate("web", &svc, &GeneratorOptions::default());
        let pod_meta = deployment.spec.unwrap().template.metadata.unwrap();
        assert_eq!(pod_meta.annotations.unwrap()["traefik.enable"], "true");
    }

    #[test]
    fn test_command_entrypoint_env() {
        let mut svc = service("node:20");
        svc.command = vec!["npm".into(), "start".into()];
        svc.entrypoint = vec!["/docker-entrypoint.sh".into()];
        svc.working_dir = Some("/app".into());
        svc.environment = IndexMap::from([
            ("NODE_ENV".to_string(), "production".to_string()),
            ("DB_PASSWORD".to_string(), "hunter2".to_string()),
        ]);

        let deployment = generate("api", &svc, &GeneratorOptions::default());
        let c = container(&deployment);
        assert_eq!(c.command.as_ref().unwrap(), &vec!["npm", "start"]);
        assert_eq!(c.args.as_ref().unwrap(), &vec!["/docker-entrypoint.sh"]);
        assert_eq!(c.working_dir.as_deref(), Some("/app"));

        let env = c.env.as_ref().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[1].name, "DB_PASSWORD");
        assert_eq!(env[1].value.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_probes_attached() {
        let mut svc = service("postgres:16");
        svc.healthcheck = Some(HealthCheck {
            test: vec!["CMD-SHELL".into(), "pg_isready".into()],
            interval: Some("10s".into()),
            ..Default::default()
        });
        let deployment = generate("db", &svc, &GeneratorOptions::default());
        let c = container(&deployment);
        assert_eq!(c.liveness_probe, c.readiness_probe);
        assert_eq!(c.liveness_probe.as_ref().unwrap().period_seconds, Some(10));
    }

    #[test]
    fn test_memory_quantity() {
        assert_eq!(memory_quantity("512m"), "512Mi");
        assert_eq!(memory_quantity("512M"), "512Mi");
        assert_eq!(memory_quantity("1g"), "1Gi");
        assert_eq!(memory_quantity("2gb"), "2Gi");
        assert_eq!(memory_quantity("100k"), "100Ki");
        assert_eq!(memory_quantity("1024b"), "1024");
        assert_eq!(memory_quantity("1.5g"), "1.5Gi");
        assert_eq!(memory_quantity("512Mi"), "512Mi");
        assert_eq!(memory_quantity("lots"), "lots");
    }

    #[test]
    fn test_resources() {
        let mut svc = service("nginx");
        svc.deploy = Some(Deploy {
            resources: Some(Resources {
                limits: Some(ResourceSpec {
                    cpus: Some("0.5".into()),
                    memory: Some("512m".into()),
                }),
                reservations: Some(ResourceSpec {
                    cpus: None,
                    memory: Some("256m".into()),
                }),
            }),
            ..Default::default()
        });

        let res = resources(&svc).unwrap();
        let limits = res.limits.unwrap();
        assert_eq!(limits["cpu"], Quantity("0.5".into()));
        assert_eq!(limits["memory"], Quantity("512Mi".into()));
        let requests = res.requests.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests["memory"], Quantity("256Mi".into()));
    }

    #[test]
    fn test_resources_omitted_when_empty() {
        let mut svc = service("nginx");
        svc.deploy = Some(Deploy {
            resources: Some(Resources {
                limits: Some(ResourceSpec::default()),
                reservations: None,
            }),
            ..Default::default()
        });
        assert!(resources(&svc).is_none());
    }

    #[test]
    fn test_security_context() {
        let mut svc = service("nginx");
        svc.user = Some("1000:2000".into());
        svc.read_only = true;
        let ctx = security_context(&svc).unwrap();
        assert_eq!(ctx.run_as_user, Some(1000));
        assert_eq!(ctx.run_as_group, Some(2000));
        assert_eq!(ctx.read_only_root_filesystem, Some(true));
        assert_eq!(ctx.privileged, None);
    }

    #[test]
    fn test_security_context_ignores_named_user() {
        let mut svc = service("nginx");
        svc.user = Some("www-data".into());
        assert!(security_context(&svc).is_none());

        svc.privileged = true;
        let ctx = security_context(&svc).unwrap();
        assert_eq!(ctx.run_as_user, None);
        assert_eq!(ctx.privileged, Some(true));
    }
}
