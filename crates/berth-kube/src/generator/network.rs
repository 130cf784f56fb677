//! Service (network endpoint) generation

use std::collections::{BTreeMap, HashMap};

use k8s_openapi::api::core::v1::{Service as KubeService, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use super::object_meta;
use super::ports::PortMapping;
use crate::options::GeneratorOptions;

/// Port names, `<protocol>-<container port>`, suffixed `-2`, `-3`, ... on repeats
pub fn port_names(ports: &[PortMapping]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    ports
        .iter()
        .map(|port| {
            let base = format!("{}-{}", port.protocol.as_lower(), port.container);
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}-{}", base, count)
            }
        })
        .collect()
}

/// Generate the Service exposing a workload's ports
///
/// `None` when the service declares no (valid) ports.
pub fn service(name: &str, ports: &[PortMapping], options: &GeneratorOptions) -> Option<KubeService> {
    if ports.is_empty() {
        return None;
    }

    let service_ports = ports
        .iter()
        .zip(port_names(ports))
        .map(|(port, port_name)| ServicePort {
            name: Some(port_name),
            port: port.host,
            target_port: Some(IntOrString::String(port.container.to_string())),
            protocol: Some(port.protocol.as_kube().to_string()),
            ..Default::default()
        })
        .collect();

    Some(KubeService {
        metadata: object_meta(name, name, options),
        spec: Some(ServiceSpec {
            type_: Some(options.service_type.to_string()),
            selector: Some(BTreeMap::from([("app".to_string(), name.to_string())])),
            ports: Some(service_ports),
            ..Default::default()
        }),
        ..Default::default()
    })
}
