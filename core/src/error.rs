//! Error types for the ShipStation client.
//!
//! # Design
//! Configuration problems are split out into `ConfigError` because they are
//! fatal at startup and never reach the network. Everything that can go wrong
//! once a request is in flight lands in `ApiError`; non-2xx responses keep the
//! raw status and body so callers see exactly what ShipStation returned.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading credentials or publishing the config template.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "your ShipStation API key and/or API secret are not set; \
         run `shipstation publish` and fill in {missing}"
    )]
    MissingCredentials { missing: &'static str },

    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config file {0} already exists; pass --force to overwrite it")]
    TemplateExists(PathBuf),
}

/// Errors returned by the client verbs and helpers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The request never produced a response (DNS, TLS, connection reset...).
    #[error("http transport error: {0}")]
    Transport(#[from] Box<ureq::Error>),

    /// ShipStation answered with a non-2xx status.
    #[error("api error: status={status}, body={body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid request uri {uri:?}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("api returned unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(Box::new(err))
    }
}
