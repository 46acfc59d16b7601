//! Comparisons between the expected state and a cache snapshot.
//!
//! These functions assume the collections they read are valid; deciding
//! whether a check may run at all is up to the caller.
use crate::cache::Resources;
use crate::config::{AppConfig, SpaceConfig};

/// Apps that are deployed but not configured, and required apps that are not deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppDrift {
    pub unknown: Vec<String>,
    pub missing: Vec<String>,
}

/// Routes mapped to configured apps without being configured, and configured
/// routes that do not exist. Both lists hold `<app>:<host>.<domain>` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDrift {
    pub unknown: Vec<String>,
    pub missing: Vec<String>,
}

pub fn app_drift(resources: &Resources, config: &AppConfig) -> AppDrift {
    let mut unknown: Vec<String> = resources
        .apps
        .names()
        .filter(|name| !config.apps.contains_key(*name))
        .map(str::to_owned)
        .collect();
    let mut missing: Vec<String> = config
        .apps
        .values()
        .filter(|app| !app.optional && !resources.apps.contains_name(&app.name))
        .map(|app| app.name.clone())
        .collect();

    unknown.sort();
    missing.sort();
    AppDrift { unknown, missing }
}

pub fn route_drift(resources: &Resources, config: &AppConfig) -> RouteDrift {
    let mut missing = Vec::new();
    for app in config.apps.values() {
        // An optional app that is not deployed has no routes to miss.
        if app.optional && !resources.apps.contains_name(&app.name) {
            continue;
        }
        for route in &app.routes {
            if resources
                .find_route_by_url(route.host(), route.domain())
                .is_none()
            {
                missing.push(format!("{}:{}.{}", app.name, route.host(), route.domain()));
            }
        }
    }

    let mut unknown = Vec::new();
    for mapping in resources.route_mappings.items() {
        let Ok(resolved) = resources.mapping_resources(&mapping.guid) else {
            continue;
        };
        let Some(app) = config.apps.get(&resolved.app.name) else {
            continue;
        };
        let url = format!("{}.{}", resolved.route.host, resolved.domain_name);
        if !app.contains_route(&url) {
            unknown.push(format!("{}:{}", resolved.app.name, url));
        }
    }

    missing.sort();
    unknown.sort();
    RouteDrift { unknown, missing }
}

/// Configured apps whose observed SSH setting differs from the desired one.
pub fn app_ssh_violations(resources: &Resources, config: &AppConfig) -> Vec<String> {
    let mut violations: Vec<String> = config
        .apps
        .values()
        .filter(|entry| {
            resources
                .apps
                .get_by_name(&entry.name)
                .is_some_and(|app| app.ssh_enabled != !entry.ssh_disabled)
        })
        .map(|entry| entry.name.clone())
        .collect();
    violations.sort();
    violations
}

/// Configured spaces whose `allow_ssh` differs from the deployed space of the
/// same name. Deployed spaces missing from the config are ignored.
pub fn space_ssh_violations(resources: &Resources, config: &SpaceConfig) -> Vec<String> {
    let mut violations: Vec<String> = config
        .spaces
        .values()
        .filter(|entry| {
            resources
                .spaces
                .get_by_name(&entry.name)
                .is_some_and(|space| space.allow_ssh != entry.allow_ssh)
        })
        .map(|entry| entry.name.clone())
        .collect();
    violations.sort();
    violations
}
