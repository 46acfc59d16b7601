use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// A validation check category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    Apps,
    Routes,
    AppSsh,
    Spaces,
}

impl Check {
    pub const ALL: [Check; 4] = [Check::Apps, Check::Routes, Check::AppSsh, Check::Spaces];

    pub fn as_str(self) -> &'static str {
        match self {
            Check::Apps => "app",
            Check::Routes => "route",
            Check::AppSsh => "app_ssh",
            Check::Spaces => "space",
        }
    }
}

/// A drift gauge, set to the number of offending resources after every completed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drift {
    UnknownApps,
    MissingApps,
    UnknownRoutes,
    MissingRoutes,
    AppSsh,
    SpaceSsh,
}

impl Drift {
    pub const ALL: [Drift; 6] = [
        Drift::UnknownApps,
        Drift::MissingApps,
        Drift::UnknownRoutes,
        Drift::MissingRoutes,
        Drift::AppSsh,
        Drift::SpaceSsh,
    ];

    fn name(self) -> &'static str {
        match self {
            Drift::UnknownApps => "unknown_apps_total",
            Drift::MissingApps => "missing_apps_total",
            Drift::UnknownRoutes => "unknown_app_routes_total",
            Drift::MissingRoutes => "missing_app_routes_total",
            Drift::AppSsh => "ssh_app_misconfiguration_total",
            Drift::SpaceSsh => "ssh_space_misconfiguration_total",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Drift::UnknownApps => "Number of apps deployed that are not in the config",
            Drift::MissingApps => "Number of non-optional apps in the config that are not deployed",
            Drift::UnknownRoutes => "Number of routes mapped to configured apps that are not in the config",
            Drift::MissingRoutes => "Number of routes in the config that are not deployed",
            Drift::AppSsh => "Number of apps that have misconfigured SSH access settings",
            Drift::SpaceSsh => "Number of spaces that have misconfigured SSH access settings",
        }
    }
}

/// Receives the results of the detector's checks.
pub trait MetricsSink: Send + Sync {
    fn check_succeeded(&self, check: Check);

    /// Called when a check was skipped because the data it needs is stale.
    fn check_failed(&self, check: Check);

    fn set_drift(&self, drift: Drift, count: usize);
}

#[derive(Debug, Clone, Default)]
struct CheckCounters {
    failed: Counter,
    success: Counter,
}

/// Prometheus metrics exported on `/metrics`.
///
/// Clones share the underlying values.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    checks: [CheckCounters; 4],
    drift: [Gauge; 6],
}

impl Metrics {
    pub fn register(prom: &mut Registry) -> Self {
        let metrics = Self::default();

        for check in Check::ALL {
            let counters = metrics.counters(check);
            prom.register(
                format!("{}_checks_failed", check.as_str()),
                format!(
                    "Number of times the {} check was skipped because of stale data",
                    check.as_str()
                ),
                counters.failed.clone(),
            );
            prom.register(
                format!("{}_checks_success", check.as_str()),
                format!("Number of times the {} check has succeeded", check.as_str()),
                counters.success.clone(),
            );
        }

        for drift in Drift::ALL {
            prom.register(drift.name(), drift.help(), metrics.gauge(drift).clone());
        }

        metrics
    }

    pub fn checks_succeeded(&self, check: Check) -> u64 {
        self.counters(check).success.get()
    }

    pub fn checks_failed(&self, check: Check) -> u64 {
        self.counters(check).failed.get()
    }

    pub fn drift(&self, drift: Drift) -> i64 {
        self.gauge(drift).get()
    }

    fn counters(&self, check: Check) -> &CheckCounters {
        &self.checks[check as usize]
    }

    fn gauge(&self, drift: Drift) -> &Gauge {
        &self.drift[drift as usize]
    }
}

impl MetricsSink for Metrics {
    fn check_succeeded(&self, check: Check) {
        self.counters(check).success.inc();
    }

    fn check_failed(&self, check: Check) {
        self.counters(check).failed.inc();
    }

    fn set_drift(&self, drift: Drift, count: usize) {
        self.gauge(drift)
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

#[cfg(test)]
mod tests {
    use prometheus_client::encoding::text::encode;

    use super::*;

    #[test]
    fn test_counters_and_gauges() {
        let metrics = Metrics::default();
        metrics.check_succeeded(Check::Routes);
        metrics.check_succeeded(Check::Routes);
        metrics.check_failed(Check::Spaces);
        metrics.set_drift(Drift::MissingRoutes, 3);

        assert_eq!(metrics.checks_succeeded(Check::Routes), 2);
        assert_eq!(metrics.checks_failed(Check::Routes), 0);
        assert_eq!(metrics.checks_failed(Check::Spaces), 1);
        assert_eq!(metrics.drift(Drift::MissingRoutes), 3);
        assert_eq!(metrics.drift(Drift::UnknownRoutes), 0);
    }

    #[test]
    fn test_clones_share_values() {
        let metrics = Metrics::default();
        let clone = metrics.clone();
        clone.set_drift(Drift::UnknownApps, 7);
        assert_eq!(metrics.drift(Drift::UnknownApps), 7);
    }

    #[test]
    fn test_exposition_names() {
        let mut registry = Registry::with_prefix("watchtower");
        let metrics = Metrics::register(&mut registry);
        metrics.check_succeeded(Check::Apps);
        metrics.check_failed(Check::AppSsh);
        metrics.set_drift(Drift::UnknownApps, 2);
        metrics.set_drift(Drift::SpaceSsh, 1);

        let mut out = String::new();
        encode(&mut out, &registry).unwrap();

        assert!(out.contains("watchtower_app_checks_success_total 1"), "{out}");
        assert!(out.contains("watchtower_app_checks_failed_total 0"), "{out}");
        assert!(out.contains("watchtower_app_ssh_checks_failed_total 1"), "{out}");
        assert!(out.contains("watchtower_route_checks_success_total 0"), "{out}");
        assert!(out.contains("watchtower_space_checks_success_total 0"), "{out}");
        assert!(out.contains("watchtower_unknown_apps_total 2"), "{out}");
        assert!(out.contains("watchtower_missing_app_routes_total 0"), "{out}");
        assert!(out.contains("watchtower_ssh_space_misconfiguration_total 1"), "{out}");
    }
}
