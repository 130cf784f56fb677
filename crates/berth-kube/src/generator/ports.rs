//! Port mapping policy
//!
//! | Entry | Host | Container | Protocol |
//! |-------|------|-----------|----------|
//! | `"80"` | 80 | 80 | TCP |
//! | `"8080:80"` | 8080 | 80 | TCP |
//! | `"8080:80:udp"` | 8080 | 80 | UDP |
//! | `"127.0.0.1:8080:80"` | 8080 | 80 | TCP |

use std::collections::HashSet;

use k8s_openapi::api::core::v1::ContainerPort;

use crate::error::{ConversionError, errors};

/// Transport protocol of a port mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("tcp") {
            Some(Self::Tcp)
        } else if token.eq_ignore_ascii_case("udp") {
            Some(Self::Udp)
        } else {
            None
        }
    }

    /// Kubernetes spelling (`TCP`, `UDP`)
    pub fn as_kube(&self) -> &'static str {
        match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        }
    }

    /// Lowercase spelling used in port names
    pub fn as_lower(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// A parsed port mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    pub host_ip: Option<String>,
    pub host: i32,
    pub container: i32,
    pub protocol: Protocol,
}

impl PortMapping {
    pub fn container_port(&self) -> ContainerPort {
        ContainerPort {
            container_port: self.container,
            protocol: Some(self.protocol.as_kube().to_string()),
            ..Default::default()
        }
    }
}

/// Parse one short-syntax port entry
pub fn parse_port(entry: &str) -> Result<PortMapping, String> {
    let segments: Vec<&str> = entry.split(':').collect();

    let (host_ip, host, container, protocol) = match segments.as_slice() {
        [port] => (None, *port, *port, Protocol::Tcp),
        [host, container] => (None, *host, *container, Protocol::Tcp),
        [first, second, third] => match Protocol::parse(third) {
            Some(protocol) => (None, *first, *second, protocol),
            None => (Some((*first).to_string()), *second, *third, Protocol::Tcp),
        },
        _ => {
            return Err(format!(
                "expected 1 to 3 colon-separated segments, found {}",
                segments.len()
            ));
        }
    };

    Ok(PortMapping {
        host_ip: host_ip.filter(|ip| !ip.is_empty()),
        host: port_number(host, "host")?,
        container: port_number(container, "container")?,
        protocol,
    })
}

fn port_number(segment: &str, side: &str) -> Result<i32, String> {
    if segment.is_empty() {
        return Err(format!("empty {} port", side));
    }
    let port: i32 = segment
        .parse()
        .map_err(|_| format!("{} port '{}' is not a number", side, segment))?;
    if !(1..=65535).contains(&port) {
        return Err(format!("{} port {} is out of range 1-65535", side, port));
    }
    Ok(port)
}

/// Parse every port of a service, collecting one error per bad entry
pub fn parse_ports(
    service: &str,
    entries: &[String],
    errors: &mut Vec<ConversionError>,
) -> Vec<PortMapping> {
    entries
        .iter()
        .filter_map(|entry| match parse_port(entry) {
            Ok(mapping) => Some(mapping),
            Err(reason) => {
                errors.push(errors::invalid_port(service, entry, &reason));
                None
            }
        })
        .collect()
}

/// Container ports, one per distinct (container port, protocol) pair
pub fn container_ports(mappings: &[PortMapping]) -> Vec<ContainerPort> {
    let mut seen = HashSet::new();
    mappings
        .iter()
        .filter(|m| seen.insert((m.container, m.protocol)))
        .map(PortMapping::container_port)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(host: i32, container: i32, protocol: Protocol) -> PortMapping {
        PortMapping {
            host_ip: None,
            host,
            container,
            protocol,
        }
    }

    #[test]
    fn test_single_port() {
        assert_eq!(parse_port("80").unwrap(), mapping(80, 80, Protocol::Tcp));
    }

    #[test]
    fn test_host_container() {
        assert_eq!(parse_port("8080:80").unwrap(), mapping(8080, 80, Protocol::Tcp));
    }

    #[test]
    fn test_protocol_suffix() {
        assert_eq!(parse_port("53:53:udp").unwrap(), mapping(53, 53, Protocol::Udp));
        assert_eq!(parse_port("53:53:UDP").unwrap(), mapping(53, 53, Protocol::Udp));
        assert_eq!(parse_port("80:80:tcp").unwrap(), mapping(80, 80, Protocol::Tcp));
    }

    #[test]
    fn test_host_ip_prefix() {
        let parsed = parse_port("127.0.0.1:8080:80").unwrap();
        assert_eq!(parsed.host_ip.as_deref(), Some("127.0.0.1"));
        assert_eq!(parsed.host, 8080);
        assert_eq!(parsed.container, 80);
        assert_eq!(parsed.protocol, Protocol::Tcp);
    }

    #[test]
    fn test_protocol_is_matched_exactly() {
        let err = parse_port("8080:80:udpx").unwrap_err();
        assert_eq!(err, "container port 'udpx' is not a number");
    }

    #[test]
    fn test_invalid_ports() {
        assert_eq!(parse_port(":80").unwrap_err(), "empty host port");
        assert!(parse_port("80:").is_err());
        assert!(parse_port("http").is_err());
        assert!(parse_port("0").is_err());
        assert!(parse_port("70000:80").is_err());
        assert!(parse_port("1:2:3:4").is_err());
    }

    #[test]
    fn test_parse_ports_collects_errors() {
        let mut errors = Vec::new();
        let entries = vec!["80".to_string(), ":81".to_string(), "8443:443".to_string()];
        let parsed = parse_ports("web", &entries, &mut errors);

        assert_eq!(parsed.len(), 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, crate::error::ErrorCode::InvalidPort);
        assert!(errors[0].message.contains("':81'"));
    }

    #[test]
    fn test_container_ports_deduplicate() {
        let mappings = vec![
            mapping(8080, 80, Protocol::Tcp),
            mapping(8081, 80, Protocol::Tcp),
            mapping(8080, 80, Protocol::Udp),
        ];
        let ports = container_ports(&mappings);
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].container_port, 80);
        assert_eq!(ports[0].protocol.as_deref(), Some("TCP"));
        assert!(ports[0].host_port.is_none());
        assert_eq!(ports[1].protocol.as_deref(), Some("UDP"));
    }
}
