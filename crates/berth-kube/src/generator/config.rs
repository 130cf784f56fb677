//! ConfigMap generation

use std::collections::BTreeMap;

use berth_compose::Service;
use k8s_openapi::api::core::v1::ConfigMap;

use super::object_meta;
use crate::options::GeneratorOptions;

/// Name fragments that mark a variable as secret-like (case-insensitive)
pub const SECRET_MARKERS: [&str; 12] = [
    "password",
    "passwd",
    "pwd",
    "secret",
    "key",
    "token",
    "api_key",
    "apikey",
    "private",
    "credential",
    "auth",
    "oauth",
];

/// Substring match against [`SECRET_MARKERS`]. A naming heuristic only.
pub fn is_secret_like(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    SECRET_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Secret-like variable names of a service, in declaration order
pub fn secret_like_names(service: &Service) -> Vec<&str> {
    service
        .environment
        .keys()
        .map(String::as_str)
        .filter(|name| is_secret_like(name))
        .collect()
}

/// Generate `<service>-config` from the non-secret environment
///
/// `None` when nothing remains after filtering.
pub fn config_map(name: &str, service: &Service, options: &GeneratorOptions) -> Option<ConfigMap> {
    let data: BTreeMap<String, String> = service
        .environment
        .iter()
        .filter(|(key, _)| !is_secret_like(key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if data.is_empty() {
        return None;
    }

    Some(ConfigMap {
        metadata: object_meta(&format!("{}-config", name), name, options),
        data: Some(data),
        ..Default::default()
    })
}
