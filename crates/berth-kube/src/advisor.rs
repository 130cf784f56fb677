//! Feature advisor
//!
//! Flags compose features that have no faithful Kubernetes equivalent. The
//! advisor only reads the service; it never affects what gets generated.

use berth_compose::Service;

use crate::error::{ConversionWarning, warnings};
use crate::generator::{config, health};

/// Namespace modes with nothing to translate
const ISOLATED_MODES: [&str; 3] = ["", "none", "private"];

fn shares_namespace(mode: Option<&str>) -> Option<&str> {
    mode.filter(|m| !ISOLATED_MODES.contains(&m.trim()))
}

/// Advisory warnings for one service, in a stable order
pub fn advise(name: &str, service: &Service) -> Vec<ConversionWarning> {
    let mut out = Vec::new();

    let networks: Vec<&str> = service
        .networks
        .keys()
        .map(String::as_str)
        .filter(|n| *n != "default")
        .collect();
    if !networks.is_empty() {
        out.push(warnings::custom_networks(name, &networks));
    }

    if !service.depends_on.is_empty() {
        let deps: Vec<&str> = service.depends_on.keys().map(String::as_str).collect();
        out.push(warnings::depends_on(name, &deps));
    }

    if let Some(mode) = shares_namespace(service.pid.as_deref()) {
        out.push(warnings::pid_mode(name, mode));
    }
    if let Some(mode) = shares_namespace(service.ipc.as_deref()) {
        out.push(warnings::ipc_mode(name, mode));
    }

    if let Some(size) = service.shm_size.as_deref().filter(|s| !s.is_empty()) {
        out.push(warnings::shm_size(name, size));
    }

    if let Some(policy) = service.restart.as_deref()
        && matches!(policy, "no" | "on-failure")
    {
        out.push(warnings::restart_policy(name, policy));
    }

    if !service.env_files.is_empty() {
        out.push(warnings::env_file(name, &service.env_files));
    }

    if let Some(driver) = service
        .logging
        .as_ref()
        .and_then(|l| l.driver.as_deref())
        .filter(|d| !d.is_empty())
    {
        out.push(warnings::logging(name, driver));
    }

    if let Some(mode) = service.deploy.as_ref().and_then(|d| d.mode.as_deref())
        && mode == "global"
    {
        out.push(warnings::deploy_mode(name, mode));
    }

    if let Some(hc) = service.healthcheck.as_ref().filter(|hc| !hc.disable) {
        for (field, value) in health::invalid_durations(hc) {
            out.push(warnings::healthcheck_duration(name, field, value));
        }
    }

    let secrets = config::secret_like_names(service);
    if !secrets.is_empty() {
        out.push(warnings::secret_in_environment(name, &secrets));
    }

    out
}
