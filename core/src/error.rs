//! Error types for the API compiler and its transports.
//!
//! # Design
//! Configuration problems are reported through `ConfigError`. The fail-soft
//! `ApiCompiler::compile` path only logs them; `try_compile` hands them back
//! to the caller. Transport failures never pass through the compiler at all,
//! they travel inside whatever the transport returns.

use thiserror::Error;

/// Reasons a configuration document cannot be turned into an API surface.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is absent, `null`, `false`, `0`, `""` or an array that
    /// joins to an empty string such as `[]` or `[null]`.
    #[error("JSON is empty!")]
    Empty,

    /// The document has no own properties (`{}` or a bare scalar).
    #[error("JSON is not constructed correctly!")]
    Malformed,

    /// `host` or `endpoints` is not present.
    #[error("JSON is missing host and/or endpoints!")]
    MissingFields,

    #[error("JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("configuration could not be read: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by the bundled HTTP transports.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The transport has no way to issue this verb.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}
