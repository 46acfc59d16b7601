#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to `{url}` failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to `{url}` returned status {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to decode response from `{url}`: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid url `{url}`: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("environment variable `{0}` must be set")]
    MissingCredential(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
