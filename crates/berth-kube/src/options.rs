//! Generation options

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Container image pull policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImagePullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl ImagePullPolicy {
    pub const ALL: [ImagePullPolicy; 3] = [Self::Always, Self::IfNotPresent, Self::Never];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "Always",
            Self::IfNotPresent => "IfNotPresent",
            Self::Never => "Never",
        }
    }
}

/// Kubernetes Service type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ServiceType {
    #[default]
    ClusterIP,
    NodePort,
    LoadBalancer,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [Self::ClusterIP, Self::NodePort, Self::LoadBalancer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClusterIP => "ClusterIP",
            Self::NodePort => "NodePort",
            Self::LoadBalancer => "LoadBalancer",
        }
    }
}

/// Error for an unrecognised option value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}', expected one of: {expected}")]
pub struct ParseOptionError {
    pub value: String,
    pub expected: String,
}

macro_rules! impl_option_enum {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseOptionError;

            /// Case-insensitive match on the Kubernetes spelling
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| ParseOptionError {
                        value: s.to_string(),
                        expected: <$ty>::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

impl_option_enum!(ImagePullPolicy);
impl_option_enum!(ServiceType);

/// Options applied to every generated resource
///
/// Deserializes from the camelCase request shape
/// `{namespace, labels, annotations, imagePullPolicy, serviceType, replicas}`,
/// every key optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorOptions {
    pub namespace: String,
    pub labels: IndexMap<String, String>,
    pub annotations: IndexMap<String, String>,
    pub image_pull_policy: ImagePullPolicy,
    pub service_type: ServiceType,
    /// Replica count; falls back to `deploy.replicas`, then 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            labels: IndexMap::new(),
            annotations: IndexMap::new(),
            image_pull_policy: ImagePullPolicy::default(),
            service_type: ServiceType::default(),
            replicas: None,
        }
    }
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = Some(replicas);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GeneratorOptions::default();
        assert_eq!(opts.namespace, "default");
        assert_eq!(opts.image_pull_policy, ImagePullPolicy::IfNotPresent);
        assert_eq!(opts.service_type, ServiceType::ClusterIP);
        assert_eq!(opts.replicas, None);
    }

    #[test]
    fn test_deserialize_camel_case_request() {
        let opts: GeneratorOptions = serde_json::from_str(
            r#"{"namespace": "prod", "imagePullPolicy": "Always", "serviceType": "NodePort", "replicas": 3, "labels": {"team": "core"}}"#,
        )
        .unwrap();
        assert_eq!(opts.namespace, "prod");
        assert_eq!(opts.image_pull_policy, ImagePullPolicy::Always);
        assert_eq!(opts.service_type, ServiceType::NodePort);
        assert_eq!(opts.replicas, Some(3));
        assert_eq!(opts.labels["team"], "core");
        assert!(opts.annotations.is_empty());
    }

    #[test]
    fn test_deserialize_empty_request() {
        let opts: GeneratorOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, GeneratorOptions::default());
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!("always".parse::<ImagePullPolicy>(), Ok(ImagePullPolicy::Always));
        assert_eq!("loadbalancer".parse::<ServiceType>(), Ok(ServiceType::LoadBalancer));
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "Sometimes".parse::<ImagePullPolicy>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value 'Sometimes', expected one of: Always, IfNotPresent, Never"
        );
    }
}
