//! Property tests for port mapping and Service generation

use berth_kube::generator::{network, ports};
use berth_kube::GeneratorOptions;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use proptest::prelude::*;

proptest! {
    #[test]
    fn host_container_pair(host in 1i32..=65535, container in 1i32..=65535) {
        let mapping = ports::parse_port(&format!("{}:{}", host, container)).unwrap();
        prop_assert_eq!(mapping.host, host);
        prop_assert_eq!(mapping.container, container);
        prop_assert_eq!(mapping.protocol, ports::Protocol::Tcp);
    }

    #[test]
    fn single_port_maps_to_itself(port in 1i32..=65535) {
        let mapping = ports::parse_port(&port.to_string()).unwrap();
        prop_assert_eq!(mapping.host, port);
        prop_assert_eq!(mapping.container, port);
    }

    #[test]
    fn service_port_targets_container(host in 1i32..=65535, container in 1i32..=65535) {
        let mapping = ports::parse_port(&format!("{}:{}", host, container)).unwrap();
        let service = network::service("svc", &[mapping], &GeneratorOptions::default()).unwrap();
        let port = &service.spec.unwrap().ports.unwrap()[0];
        prop_assert_eq!(port.port, host);
        prop_assert_eq!(port.target_port.clone(), Some(IntOrString::String(container.to_string())));
    }

    #[test]
    fn out_of_range_rejected(port in 65536i32..1_000_000) {
        let single = port.to_string();
        let pair = format!("80:{}", port);
        prop_assert!(ports::parse_port(&single).is_err());
        prop_assert!(ports::parse_port(&pair).is_err());
    }

    #[test]
    fn host_ip_prefix_keeps_ports(a in 1u8..=254, host in 1i32..=65535, container in 1i32..=65535) {
        let entry = format!("10.0.0.{}:{}:{}", a, host, container);
        let mapping = ports::parse_port(&entry).unwrap();
        prop_assert_eq!(mapping.host, host);
        prop_assert_eq!(mapping.container, container);
    }
}

#[test]
fn no_ports_no_service() {
    assert!(network::service("svc", &[], &GeneratorOptions::default()).is_none());
}
