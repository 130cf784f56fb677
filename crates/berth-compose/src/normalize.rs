//! Polymorphic field normalizer
//!
//! Compose lets many fields be written in several equivalent shapes: a map
//! or a list for `environment`, a string or a list for `command`, short or
//! long syntax for `ports`, and so on. Each function here accepts every
//! admissible shape of one field and returns its single canonical form.
//!
//! | Field | Admissible shapes | Canonical |
//! |-------|-------------------|-----------|
//! | `environment`, `labels` | map of scalars, list of `NAME=VALUE` | `IndexMap<String, String>` |
//! | `networks` | list of names, map of attachments | `IndexMap<String, NetworkAttachment>` |
//! | `depends_on` | list of names, map of `{condition}` | `IndexMap<String, String>` |
//! | `command`, `entrypoint` | string, list | `Vec<String>` |
//! | `ports` | list of strings, numbers, long-syntax maps | `Vec<String>` (short syntax) |
//! | `volumes` | list of strings, long-syntax maps | `Vec<String>` (short syntax) |
//!
//! All functions are pure: the same input always yields the same output.

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::error::NormalizeError;
use crate::model::{BuildSpec, NetworkAttachment};

type Result<T> = std::result::Result<T, NormalizeError>;

const PROTOCOLS: [&str; 2] = ["tcp", "udp"];

/// Human-readable name of a YAML value's runtime type
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Render a scalar as a string (`null` becomes the empty string)
///
/// Returns `None` for sequences, mappings and tagged values.
pub fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Optional scalar field (`user: 1000`, `shm_size: 64m`, `version: 3.8`)
pub fn optional_scalar(value: Option<&Value>) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar(v)
            .map(Some)
            .ok_or_else(|| NormalizeError::mismatch("a scalar", value_kind(v))),
    }
}

fn mapping_key(key: &Value) -> Result<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(NormalizeError::mismatch("a string key", value_kind(other))),
    }
}

fn string_item(item: &Value, expected: &'static str) -> Result<String> {
    match item {
        Value::String(s) => Ok(s.clone()),
        other => Err(NormalizeError::mismatch(expected, value_kind(other))),
    }
}

fn scalar_item(item: &Value, expected: &'static str) -> Result<String> {
    scalar(item).ok_or_else(|| NormalizeError::mismatch(expected, value_kind(item)))
}

fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

/// Normalize `environment` (also used for `labels` and build `args`)
///
/// A bare `NAME` maps to the empty string. Duplicate names keep the last
/// value written, at the position of their first declaration.
pub fn environment(value: &Value) -> Result<IndexMap<String, String>> {
    const EXPECTED: &str = "a mapping or a list of NAME=VALUE strings";

    match value {
        Value::Null => Ok(IndexMap::new()),
        Value::Mapping(map) => {
            let mut env = IndexMap::with_capacity(map.len());
            for (key, val) in map {
                let name = mapping_key(key)?;
                let val = scalar_item(val, "a scalar value")?;
                env.insert(name, val);
            }
            Ok(env)
        }
        Value::Sequence(items) => {
            let mut env = IndexMap::with_capacity(items.len());
            for item in items {
                let entry = string_item(item, "a NAME=VALUE string")?;
                let (name, val) = entry.split_once('=').unwrap_or((entry.as_str(), ""));
                if name.trim().is_empty() {
                    return Err(NormalizeError::invalid(&entry, "variable name is empty"));
                }
                env.insert(name.to_string(), val.to_string());
            }
            Ok(env)
        }
        other => Err(NormalizeError::mismatch(EXPECTED, value_kind(other))),
    }
}

/// Normalize a service's `networks`
pub fn networks(value: &Value) -> Result<IndexMap<String, NetworkAttachment>> {
    const EXPECTED: &str = "a list of network names or a mapping of network configs";

    match value {
        Value::Null => Ok(IndexMap::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                string_item(item, "a network name").map(|name| (name, NetworkAttachment::default()))
            })
            .collect(),
        Value::Mapping(map) => {
            let mut networks = IndexMap::with_capacity(map.len());
            for (key, config) in map {
                let name = mapping_key(key)?;
                let attachment = match config {
                    Value::Null => NetworkAttachment::default(),
                    Value::Mapping(config) => network_attachment(config)?,
                    other => {
                        return Err(NormalizeError::mismatch(
                            "a network config mapping",
                            value_kind(other),
                        ));
                    }
                };
                networks.insert(name, attachment);
            }
            Ok(networks)
        }
        other => Err(NormalizeError::mismatch(EXPECTED, value_kind(other))),
    }
}

fn network_attachment(config: &Mapping) -> Result<NetworkAttachment> {
    let aliases = match field(config, "aliases") {
        None => Vec::new(),
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|alias| scalar_item(alias, "an alias string"))
            .collect::<Result<_>>()?,
        Some(other) => {
            return Err(NormalizeError::mismatch("a list of aliases", value_kind(other)));
        }
    };

    Ok(NetworkAttachment {
        aliases,
        ipv4_address: optional_scalar(field(config, "ipv4_address"))?,
        ipv6_address: optional_scalar(field(config, "ipv6_address"))?,
    })
}

/// Normalize `depends_on` into dependency name → condition
pub fn depends_on(value: &Value) -> Result<IndexMap<String, String>> {
    const EXPECTED: &str = "a list of service names or a mapping of conditions";

    match value {
        Value::Null => Ok(IndexMap::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| string_item(item, "a service name").map(|name| (name, String::new())))
            .collect(),
        Value::Mapping(map) => {
            let mut deps = IndexMap::with_capacity(map.len());
            for (key, config) in map {
                let name = mapping_key(key)?;
                let condition = match config {
                    Value::Null => String::new(),
                    Value::Mapping(config) => {
                        optional_scalar(field(config, "condition"))?.unwrap_or_default()
                    }
                    other => {
                        return Err(NormalizeError::mismatch(
                            "a dependency config mapping",
                            value_kind(other),
                        ));
                    }
                };
                deps.insert(name, condition);
            }
            Ok(deps)
        }
        other => Err(NormalizeError::mismatch(EXPECTED, value_kind(other))),
    }
}

/// Normalize `command` / `entrypoint`
///
/// The string form is split on whitespace; the list form is kept verbatim.
pub fn command(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(s.split_whitespace().map(str::to_string).collect()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_item(item, "a command argument"))
            .collect(),
        other => Err(NormalizeError::mismatch(
            "a string or a list of strings",
            value_kind(other),
        )),
    }
}

/// Normalize a health-check `test`
///
/// The string form is shell semantics, stored as `["CMD-SHELL", <command>]`.
pub fn healthcheck_test(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec!["CMD-SHELL".to_string(), s.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_item(item, "a command argument"))
            .collect(),
        other => Err(NormalizeError::mismatch(
            "a string or a list of strings",
            value_kind(other),
        )),
    }
}

/// Normalize `env_file`
pub fn env_files(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Mapping(entry) => optional_scalar(field(entry, "path"))?
                    .ok_or_else(|| NormalizeError::invalid("env_file entry", "missing 'path'")),
                other => Err(NormalizeError::mismatch("a file path", value_kind(other))),
            })
            .collect(),
        other => Err(NormalizeError::mismatch(
            "a path or a list of paths",
            value_kind(other),
        )),
    }
}

/// Normalize `build` (a context path or a build config mapping)
pub fn build(value: &Value) -> Result<Option<BuildSpec>> {
    match value {
        Value::Null => Ok(None),
        Value::String(context) => Ok(Some(BuildSpec {
            context: Some(context.clone()),
            ..Default::default()
        })),
        Value::Mapping(map) => Ok(Some(BuildSpec {
            context: optional_scalar(field(map, "context"))?,
            dockerfile: optional_scalar(field(map, "dockerfile"))?,
            target: optional_scalar(field(map, "target"))?,
            args: field(map, "args").map(environment).transpose()?.unwrap_or_default(),
        })),
        other => Err(NormalizeError::mismatch(
            "a context path or a build mapping",
            value_kind(other),
        )),
    }
}

/// Normalize `ports` into short syntax strings
///
/// Numbers become strings, `"80/udp"` becomes `"80:80:udp"`, and long
/// syntax maps are folded into `"[published:]target[:protocol]"`.
pub fn ports(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(short_port(s.trim())),
                Value::Number(n) => Ok(n.to_string()),
                Value::Mapping(map) => long_port(map),
                other => Err(NormalizeError::mismatch(
                    "a port string, number or mapping",
                    value_kind(other),
                )),
            })
            .collect(),
        other => Err(NormalizeError::mismatch("a list of ports", value_kind(other))),
    }
}

fn is_protocol(token: &str) -> bool {
    PROTOCOLS.iter().any(|p| token.eq_ignore_ascii_case(p))
}

fn short_port(entry: &str) -> String {
    let Some((mapping, protocol)) = entry.rsplit_once('/') else {
        return entry.to_string();
    };
    if !is_protocol(protocol) {
        return entry.to_string();
    }

    let protocol = protocol.to_ascii_lowercase();
    let segments: Vec<&str> = mapping.split(':').collect();
    match segments.as_slice() {
        [port] => format!("{port}:{port}:{protocol}"),
        [host, container] => format!("{host}:{container}:{protocol}"),
        // the host IP has no target representation, so it is dropped
        [_ip, host, container] => format!("{host}:{container}:{protocol}"),
        _ => entry.to_string(),
    }
}

fn long_port(map: &Mapping) -> Result<String> {
    let target = optional_scalar(field(map, "target"))?
        .ok_or_else(|| NormalizeError::invalid("port mapping", "missing 'target'"))?;
    let published = optional_scalar(field(map, "published"))?;
    let host_ip = optional_scalar(field(map, "host_ip"))?.filter(|ip| !ip.contains(':'));
    let protocol = optional_scalar(field(map, "protocol"))?
        .map(|p| p.to_ascii_lowercase())
        .filter(|p| p != "tcp");

    Ok(match (published, protocol, host_ip) {
        (Some(published), Some(protocol), _) => format!("{published}:{target}:{protocol}"),
        (Some(published), None, Some(ip)) => format!("{ip}:{published}:{target}"),
        (Some(published), None, None) => format!("{published}:{target}"),
        (None, Some(protocol), _) => format!("{target}:{target}:{protocol}"),
        (None, None, _) => target,
    })
}

/// Normalize `volumes` into short syntax strings
pub fn volumes(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Mapping(map) => long_volume(map),
                other => Err(NormalizeError::mismatch(
                    "a volume string or mapping",
                    value_kind(other),
                )),
            })
            .collect(),
        other => Err(NormalizeError::mismatch("a list of volumes", value_kind(other))),
    }
}

fn long_volume(map: &Mapping) -> Result<String> {
    let target = optional_scalar(field(map, "target"))?
        .ok_or_else(|| NormalizeError::invalid("volume mapping", "missing 'target'"))?;
    let kind = optional_scalar(field(map, "type"))?.unwrap_or_else(|| "volume".to_string());
    let source = optional_scalar(field(map, "source"))?.filter(|s| !s.is_empty());
    let read_only = matches!(field(map, "read_only"), Some(Value::Bool(true)));

    let mut entry = match source {
        Some(source) if kind != "tmpfs" => format!("{source}:{target}"),
        _ => target,
    };
    if read_only && entry.contains(':') {
        entry.push_str(":ro");
    }
    Ok(entry)
}

/// Check a boolean-or-mapping `external` flag
pub fn external(value: Option<&Value>) -> Result<bool> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        // `external: { name: ... }` form
        Some(Value::Mapping(_)) => Ok(true),
        Some(other) => Err(NormalizeError::mismatch(
            "a boolean or a mapping",
            value_kind(other),
        )),
    }
}
