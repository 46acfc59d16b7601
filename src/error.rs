use std::fmt::Display;

/// Startup failures. Nothing raised after startup is returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config: {0}")]
    Config(#[from] crate::config::Error),
    #[error("cloud controller: {0}")]
    CloudFoundry(#[from] crate::cloudfoundry::Error),
    #[error("api server: {0}")]
    Api(#[from] crate::api::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultOkLogExt<T, E> {
    /// Logs the error under `target`, prefixed with `context`, and discards it.
    fn ok_log(self, target: &str, context: impl Display) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, target: &str, context: impl Display) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::error!(target: target, "{context}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_log() {
        let ok: std::result::Result<u8, std::io::Error> = Ok(3);
        assert_eq!(ok.ok_log("test", "reading"), Some(3));

        let err: std::result::Result<u8, std::io::Error> =
            Err(std::io::Error::other("disk on fire"));
        assert_eq!(err.ok_log("test", "reading"), None);
    }
}
