use std::path::PathBuf;
use std::time::Duration;

/// Errors that may occur while loading the watchtower configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("port 0 is reserved and cannot be used")]
    ReservedPort,
    #[error("refresh interval {} is less than the minimum of {}", humantime::format_duration(*.interval), humantime::format_duration(*.minimum))]
    RefreshIntervalTooShort {
        interval: Duration,
        minimum: Duration,
    },
    #[error("invalid cloud controller url `{url}`: {reason}")]
    ControllerUrl { url: String, reason: &'static str },
    #[error("route `{route}` of app `{app}` must be of the form <host>.<domain>")]
    InvalidRoute { app: String, route: String },
}

pub type Result<T> = std::result::Result<T, Error>;
