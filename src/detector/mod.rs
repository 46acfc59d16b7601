//! Periodic drift detection.
//!
//! The [`Detector`] owns the resource cache and alternates between refreshing
//! it and validating it against the configuration. Refresh and validation
//! never overlap, so every check sees a consistent set of collections.
mod checks;
pub mod metrics;

use std::sync::Arc;
use std::thread::ScopedJoinHandle;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cache::{CacheStatus, ResourceCache};
use crate::cloudfoundry::Connector;
use crate::config::{Config, MIN_REFRESH_INTERVAL};

pub use checks::{AppDrift, RouteDrift};
pub use metrics::{Check, Drift, Metrics, MetricsSink};

/// Result of a single check category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome<T> {
    /// The category is disabled in the configuration.
    Disabled,
    /// The data the check needs is stale.
    Skipped,
    Completed(T),
}

impl<T> CheckOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            CheckOutcome::Completed(findings) => Some(findings),
            CheckOutcome::Disabled | CheckOutcome::Skipped => None,
        }
    }
}

/// Findings of one [`Detector::validate`] pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub apps: CheckOutcome<AppDrift>,
    pub routes: CheckOutcome<RouteDrift>,
    pub app_ssh: CheckOutcome<Vec<String>>,
    pub spaces: CheckOutcome<Vec<String>>,
}

pub struct Detector<C: Connector, S: MetricsSink> {
    config: Arc<Config>,
    cache: ResourceCache<C>,
    sink: S,
    status: watch::Sender<CacheStatus>,
}

impl<C: Connector, S: MetricsSink> Detector<C, S> {
    /// Creates the detector and runs the first validation, so the sink holds
    /// real values before the loop is started.
    pub fn new(config: Arc<Config>, cache: ResourceCache<C>, sink: S) -> Self {
        let (status, _) = watch::channel(cache.resources().status());
        let detector = Self {
            config,
            cache,
            sink,
            status,
        };
        detector.validate();
        detector
    }

    /// Receives a new [`CacheStatus`] after every refresh.
    pub fn subscribe(&self) -> watch::Receiver<CacheStatus> {
        self.status.subscribe()
    }

    /// Refreshes the cache and publishes its status.
    pub async fn refresh(&mut self) {
        self.cache.refresh().await;
        self.status.send_replace(self.cache.resources().status());
    }

    /// Runs every enabled check concurrently and waits for all of them.
    pub fn validate(&self) -> DriftReport {
        let apps_enabled = self.config.apps.enabled;
        let spaces_enabled = self.config.spaces.enabled;

        std::thread::scope(|scope| {
            let apps = apps_enabled.then(|| scope.spawn(move || self.validate_apps()));
            let routes = apps_enabled.then(|| scope.spawn(move || self.validate_app_routes()));
            let app_ssh = apps_enabled.then(|| scope.spawn(move || self.validate_app_ssh()));
            let spaces = spaces_enabled.then(|| scope.spawn(move || self.validate_spaces()));

            DriftReport {
                apps: join_check(apps),
                routes: join_check(routes),
                app_ssh: join_check(app_ssh),
                spaces: join_check(spaces),
            }
        })
    }

    /// Refreshes and validates once per refresh interval, forever.
    ///
    /// The first tick fires one interval after the call. Ticks missed while an
    /// iteration overruns are dropped, not queued.
    pub async fn run(mut self) {
        let period = self.config.global.refresh_interval.max(MIN_REFRESH_INTERVAL);
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let before = std::time::Instant::now();
            self.refresh().await;
            self.validate_in_place();
            log::debug!(
                target: "detector",
                "iteration took {} ms",
                before.elapsed().as_millis()
            );
        }
    }

    /// Runs [`Detector::validate`] from async code. On a multi-threaded runtime the
    /// worker is handed off first so other tasks keep running during the checks.
    fn validate_in_place(&self) -> DriftReport {
        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| self.validate()),
            _ => self.validate(),
        }
    }

    pub fn spawn(self) -> JoinHandle<()>
    where
        C: 'static,
        C::Controller: 'static,
        S: 'static,
    {
        tokio::spawn(self.run())
    }

    fn validate_apps(&self) -> CheckOutcome<AppDrift> {
        let resources = self.cache.resources();
        if !resources.apps.is_valid() {
            return self.skip(Check::Apps, "invalid app cache detected, skipping apps check");
        }

        let drift = checks::app_drift(resources, &self.config.apps);
        if !drift.unknown.is_empty() {
            log::info!(target: "detector", "unknown apps detected: {:?}", drift.unknown);
        }
        if !drift.missing.is_empty() {
            log::info!(target: "detector", "missing apps detected: {:?}", drift.missing);
        }

        self.sink.set_drift(Drift::UnknownApps, drift.unknown.len());
        self.sink.set_drift(Drift::MissingApps, drift.missing.len());
        self.sink.check_succeeded(Check::Apps);
        CheckOutcome::Completed(drift)
    }

    fn validate_app_routes(&self) -> CheckOutcome<RouteDrift> {
        let resources = self.cache.resources();
        if !resources.is_valid() {
            return self.skip(Check::Routes, "invalid cache detected, skipping app routes check");
        }

        let drift = checks::route_drift(resources, &self.config.apps);
        if !drift.unknown.is_empty() {
            log::info!(target: "detector", "unknown routes detected: {:?}", drift.unknown);
        }
        if !drift.missing.is_empty() {
            log::info!(target: "detector", "missing routes detected: {:?}", drift.missing);
        }

        self.sink.set_drift(Drift::UnknownRoutes, drift.unknown.len());
        self.sink.set_drift(Drift::MissingRoutes, drift.missing.len());
        self.sink.check_succeeded(Check::Routes);
        CheckOutcome::Completed(drift)
    }

    fn validate_app_ssh(&self) -> CheckOutcome<Vec<String>> {
        let resources = self.cache.resources();
        if !resources.apps.is_valid() {
            return self.skip(Check::AppSsh, "invalid app cache detected, skipping app ssh check");
        }

        let violations = checks::app_ssh_violations(resources, &self.config.apps);
        if !violations.is_empty() {
            log::info!(target: "detector", "app ssh misconfiguration detected: {:?}", violations);
        }

        self.sink.set_drift(Drift::AppSsh, violations.len());
        self.sink.check_succeeded(Check::AppSsh);
        CheckOutcome::Completed(violations)
    }

    fn validate_spaces(&self) -> CheckOutcome<Vec<String>> {
        let resources = self.cache.resources();
        if !resources.spaces.is_valid() {
            return self.skip(Check::Spaces, "invalid space cache detected, skipping spaces check");
        }

        let violations = checks::space_ssh_violations(resources, &self.config.spaces);
        if !violations.is_empty() {
            log::info!(target: "detector", "space ssh misconfiguration detected: {:?}", violations);
        }

        self.sink.set_drift(Drift::SpaceSsh, violations.len());
        self.sink.check_succeeded(Check::Spaces);
        CheckOutcome::Completed(violations)
    }

    fn skip<T>(&self, check: Check, reason: &str) -> CheckOutcome<T> {
        log::warn!(target: "detector", "{}", reason);
        self.sink.check_failed(check);
        CheckOutcome::Skipped
    }
}

fn join_check<T>(handle: Option<ScopedJoinHandle<'_, CheckOutcome<T>>>) -> CheckOutcome<T> {
    match handle {
        None => CheckOutcome::Disabled,
        Some(handle) => handle
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
    }
}
