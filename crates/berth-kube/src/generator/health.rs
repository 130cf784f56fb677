//! Health check to probe translation

use berth_compose::HealthCheck;
use k8s_openapi::api::core::v1::{ExecAction, Probe};
use once_cell::sync::Lazy;
use regex::Regex;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<h>\d+)h)?(?:(?P<m>\d+)m)?(?:(?P<s>\d+)s)?$").expect("valid duration regex")
});

/// Convert a compose duration to whole seconds
///
/// Accepts `30s`, `5m`, `1h`, compounds such as `1m30s`, and bare
/// integers (seconds). Anything else, including sub-second units, is `None`.
pub fn parse_duration(value: &str) -> Option<i32> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(seconds) = value.parse::<i32>() {
        return (seconds >= 0).then_some(seconds);
    }

    let caps = DURATION.captures(value)?;
    let part = |name: &str, scale: i64| -> Option<i64> {
        match caps.name(name) {
            Some(m) => m.as_str().parse::<i64>().ok()?.checked_mul(scale),
            None => Some(0),
        }
    };
    let total = part("h", 3600)?
        .checked_add(part("m", 60)?)?
        .checked_add(part("s", 1)?)?;
    i32::try_from(total).ok()
}

/// The duration fields of a health check that cannot be converted
pub fn invalid_durations(hc: &HealthCheck) -> Vec<(&'static str, &str)> {
    [
        ("interval", hc.interval.as_deref()),
        ("timeout", hc.timeout.as_deref()),
        ("start_period", hc.start_period.as_deref()),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.map(|v| (field, v)))
    .filter(|(_, value)| parse_duration(value).is_none())
    .collect()
}

fn probe_command(test: &[String]) -> Option<Vec<String>> {
    let (head, rest) = test.split_first()?;
    let command = match head.as_str() {
        "NONE" => return None,
        "CMD" => rest.to_vec(),
        "CMD-SHELL" => vec!["sh".to_string(), "-c".to_string(), rest.join(" ")],
        _ => test.to_vec(),
    };
    (!command.is_empty() && !command.iter().all(|arg| arg.trim().is_empty())).then_some(command)
}

/// Build an exec probe from a health check
///
/// `None` when the check is disabled or has no usable test command.
pub fn probe(hc: &HealthCheck) -> Option<Probe> {
    if hc.disable {
        return None;
    }
    let command = probe_command(&hc.test)?;

    let seconds = |value: &Option<String>| value.as_deref().and_then(parse_duration);

    Some(Probe {
        exec: Some(ExecAction {
            command: Some(command),
        }),
        period_seconds: seconds(&hc.interval),
        timeout_seconds: seconds(&hc.timeout),
        initial_delay_seconds: seconds(&hc.start_period),
        failure_threshold: hc.retries.and_then(|r| i32::try_from(r).ok()),
        ..Default::default()
    })
}

/// Liveness and readiness probes as two independently owned values
pub fn probes(hc: &HealthCheck) -> Option<(Probe, Probe)> {
    let liveness = probe(hc)?;
    let readiness = liveness.clone();
    Some((liveness, readiness))
}
