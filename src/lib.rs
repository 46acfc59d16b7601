//! Watchtower: detects drift between a Cloud Foundry environment and the
//! state declared in its configuration.
//!
//! The cloud controller is polled on a fixed interval. Deployed apps, routes
//! and spaces are compared against the configured allow list and the findings
//! are exported as Prometheus metrics.
use std::path::Path;
use std::sync::Arc;

use prometheus_client::registry::Registry;

pub mod api;
pub mod cache;
pub mod cloudfoundry;
pub mod config;
pub mod detector;
pub mod error;

#[cfg(test)]
mod testing;

/// Runs watchtower with the configuration at `config_path`.
///
/// Loads the config, connects to the cloud controller, performs the first
/// refresh and validation, then starts the detector loop, the health monitor,
/// and the API server.
///
/// # Errors
///
/// Possible errors include:
/// - An unreadable or invalid config file.
/// - Missing `CF_USER` / `CF_PASS` environment variables.
/// - Failure to log in to the cloud controller.
/// - Failure to bind the API port.
pub async fn run(config_path: impl AsRef<Path>) -> error::Result<()> {
    let config = Arc::new(config::Config::load(config_path)?);
    log::info!(
        "loaded config: apps check enabled={}, spaces check enabled={}, refresh interval {}",
        config.apps.enabled,
        config.spaces.enabled,
        humantime::format_duration(config.global.refresh_interval)
    );

    let credentials = cloudfoundry::Credentials::from_env()?;
    let connector =
        cloudfoundry::HttpConnector::new(&config.global.cloud_controller_url, credentials)?;
    let http = connector.http().clone();
    let api_url = connector.api_url().clone();

    let cache = cache::ResourceCache::new(connector).await?;
    log::debug!("initial cache status: {:?}", cache.resources().status());

    let mut registry = Registry::with_prefix("watchtower");
    let metrics = detector::Metrics::register(&mut registry);
    let detector = detector::Detector::new(Arc::clone(&config), cache, metrics);
    let cache_status = detector.subscribe();
    detector.spawn();

    let health = api::Health::default();
    tokio::spawn(health.clone().monitor(http, api_url));

    let api = api::APIServer::new(registry, &config, health, cache_status)?;
    api.listen(("0.0.0.0", config.global.port)).await?;
    Ok(())
}
