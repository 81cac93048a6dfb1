use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("unsupported scheme '{0}', expected ws or wss")]
    UnsupportedScheme(String),
    #[error("controller host must not be empty")]
    EmptyHost,
    #[error("invalid controller url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
