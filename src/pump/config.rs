//! Pump configuration.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use super::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, READ_TIMEOUT_SECS, STOP_WAIT,
    TIMEOUT_RANGE_SECS,
};
use super::error::ConfigError;

/// Settings for a [`StreamPump`](super::StreamPump).
///
/// Defaults:
/// - no User-Agent override (the client identifies as `stream-pump/<version>`)
/// - chunk size: 8192 bytes
/// - connect timeout: 5 seconds
/// - read timeout: 30 seconds
/// - stop wait: 2 seconds
///
/// The two timeouts stay separate: a connect timeout means the host is
/// unreachable, a read timeout means an established stream stalled.
///
/// # Example
///
/// ```
/// use stream_pump::PumpConfig;
///
/// let config = PumpConfig::default()
///     .with_user_agent("VLC/3.0.20 LibVLC/3.0.20")
///     .with_header("Referer", "https://portal.example/")
///     .with_chunk_size(188 * 64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpConfig {
    user_agent: Option<String>,
    headers: Vec<(String, String)>,
    chunk_size: usize,
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
    stop_wait: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            headers: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
            stop_wait: STOP_WAIT,
        }
    }
}

impl PumpConfig {
    /// Sends `user_agent` as the request User-Agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Adds an extra request header. Repeated names are all sent.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the largest number of bytes forwarded per conduit write.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the connect timeout in seconds.
    #[must_use]
    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Sets the read timeout in seconds.
    #[must_use]
    pub fn with_read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    /// Sets how long `stop()` waits for the worker to exit.
    #[must_use]
    pub fn with_stop_wait(mut self, wait: Duration) -> Self {
        self.stop_wait = wait;
        self
    }

    /// Configured User-Agent override, if any.
    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Bytes per conduit write.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Upper bound on `stop()`'s wait for the worker.
    #[must_use]
    pub fn stop_wait(&self) -> Duration {
        self.stop_wait
    }

    /// Validates values against the accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an out-of-range chunk size or timeout, or a
    /// header that is not valid HTTP.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            return Err(ConfigError::ChunkSize {
                value: self.chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }
        validate_timeout_secs("connect_timeout", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout", self.read_timeout_secs)?;
        self.request_headers().map(|_| ())
    }

    /// Builds the headers sent with the GET request.
    ///
    /// Extra headers come first; a configured User-Agent replaces any
    /// User-Agent given as an extra header.
    pub(crate) fn request_headers(&self) -> Result<HeaderMap, ConfigError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let invalid = || ConfigError::Header { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.append(header_name, header_value);
        }
        if let Some(user_agent) = &self.user_agent {
            let value = HeaderValue::from_str(user_agent).map_err(|_| ConfigError::Header {
                name: USER_AGENT.as_str().to_string(),
            })?;
            headers.insert(USER_AGENT, value);
        }
        Ok(headers)
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if TIMEOUT_RANGE_SECS.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Timeout { field, value })
    }
}
