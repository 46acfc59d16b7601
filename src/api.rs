use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use serde::Serialize;
use tokio::net::ToSocketAddrs;
use tokio::sync::watch;

use crate::cache::CacheStatus;
use crate::config::Config;

mod health;

pub use health::{HEALTH_CHECK_INTERVAL, Health, HealthStatus, probe};

const OPENMETRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to render config: {0}")]
    Config(#[from] crate::config::Error),
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone)]
struct AppState {
    registry: Arc<Registry>,
    config_yaml: Arc<str>,
    health: Health,
    cache_status: watch::Receiver<CacheStatus>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    #[serde(flatten)]
    health: HealthStatus,
    cache: CacheStatus,
}

async fn metrics(State(state): State<AppState>) -> Response {
    let mut body = String::new();
    if let Err(err) = encode(&mut body, &state.registry) {
        log::error!(target: "api", "failed to encode metrics: {}", err);
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response();
    }
    ([(CONTENT_TYPE, OPENMETRICS_CONTENT_TYPE)], body).into_response()
}

async fn config_yaml(State(state): State<AppState>) -> Response {
    (
        [(CONTENT_TYPE, "application/yaml")],
        state.config_yaml.to_string(),
    )
        .into_response()
}

async fn health_status(State(state): State<AppState>) -> Response {
    let health = state.health.get().await;
    let cache = state.cache_status.borrow().clone();
    let code = StatusCode::from_u16(health.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(HealthResponse { health, cache })).into_response()
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    /// # Errors
    ///
    /// Returns an error if the config cannot be rendered as YAML.
    pub fn new(
        registry: Registry,
        config: &Config,
        health: Health,
        cache_status: watch::Receiver<CacheStatus>,
    ) -> Result<Self> {
        let state = AppState {
            registry: Arc::new(registry),
            config_yaml: config.to_yaml()?.into(),
            health,
            cache_status,
        };
        let router = axum::Router::new()
            .route("/metrics", get(metrics))
            .route("/config", get(config_yaml))
            .route("/health", get(health_status))
            .with_state(state);
        Ok(Self { router })
    }

    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the server fails.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(Error::Bind)?;
        if let Ok(local) = listener.local_addr() {
            log::info!(target: "api", "listening on {}", local);
        }
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(Error::Serve)
    }
}
