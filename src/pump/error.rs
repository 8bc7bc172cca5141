//! Error types for the pump module.
//!
//! Only [`StartError`] and [`ConfigError`] ever reach the caller. Failures
//! inside the worker ([`PumpError`]) are logged and recorded as a
//! [`PumpExit`](super::PumpExit); the reader only sees the stream end.

use std::io;

use thiserror::Error;

/// Errors returned by [`StreamPump::start`](super::StreamPump::start).
#[derive(Debug, Error)]
pub enum StartError {
    /// `start()` was called while a worker is still running.
    #[error("stream pump for {url} is already running")]
    AlreadyRunning {
        /// Target URL of the pump.
        url: String,
    },

    /// The OS pipe could not be created (e.g. descriptor exhaustion).
    #[error("failed to create conduit: {0}")]
    Conduit(#[source] io::Error),

    /// The worker thread could not be spawned.
    #[error("failed to spawn stream pump worker: {0}")]
    Spawn(#[source] io::Error),
}

/// Invalid [`PumpConfig`](super::PumpConfig) values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Chunk size outside `1..=MAX_CHUNK_SIZE`.
    #[error("invalid chunk size {value}: expected 1..={max}")]
    ChunkSize {
        /// Rejected value.
        value: usize,
        /// Upper bound.
        max: usize,
    },

    /// Timeout outside the accepted range.
    #[error("invalid {field}: {value}s, expected 1..=3600 seconds")]
    Timeout {
        /// Which timeout was rejected.
        field: &'static str,
        /// Rejected value in seconds.
        value: u64,
    },

    /// Header name or value is not valid HTTP.
    #[error("invalid header `{name}`")]
    Header {
        /// Offending header name.
        name: String,
    },
}

/// Failures of a single worker run.
#[derive(Debug, Error)]
pub(crate) enum PumpError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("failed to build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to start worker runtime: {0}")]
    Runtime(#[source] io::Error),
}

impl PumpError {
    /// Sorts a reqwest failure into connect-level or generic request error.
    pub(crate) fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_connect() {
            Self::Connect {
                url: url.into(),
                source,
            }
        } else {
            Self::Request {
                url: url.into(),
                source,
            }
        }
    }
}
