use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::cloudfoundry::check_info_endpoint;

pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Reachability of the Cloud Controller as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// HTTP status code served on `/health`.
    pub status: u16,
    pub message: String,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: 200,
            message: "Healthy".to_owned(),
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }
}

/// Shared handle to the latest [`HealthStatus`]. Starts out healthy.
#[derive(Debug, Clone)]
pub struct Health {
    inner: Arc<RwLock<HealthStatus>>,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HealthStatus::healthy())),
        }
    }
}

impl Health {
    pub async fn get(&self) -> HealthStatus {
        self.inner.read().await.clone()
    }

    pub async fn set(&self, status: HealthStatus) {
        *self.inner.write().await = status;
    }

    /// Probes `{api_url}/v2/info` every [`HEALTH_CHECK_INTERVAL`], forever.
    pub async fn monitor(self, http: reqwest::Client, api_url: Url) {
        let mut interval = tokio::time::interval(HEALTH_CHECK_INTERVAL);
        loop {
            interval.tick().await;
            self.set(probe(&http, &api_url).await).await;
        }
    }
}

pub async fn probe(http: &reqwest::Client, api_url: &Url) -> HealthStatus {
    match check_info_endpoint(http, api_url).await {
        Ok(()) => HealthStatus::healthy(),
        Err(err) => {
            log::warn!(target: "api", "health check failed: {}", err);
            HealthStatus::unhealthy(err.to_string())
        }
    }
}
