//! The pump's background unit: fetch, forward, classify, clean up.

use std::io;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::client::build_client;
use super::conduit::WriteEnd;
use super::config::PumpConfig;
use super::constants::PROGRESS_LOG_INTERVAL;
use super::error::PumpError;
use super::state::{PumpExit, PumpState};
use crate::dns::{is_dns_error, render_error_chain};

/// Everything one run needs; moved onto the worker thread.
pub(crate) struct Worker {
    pub(crate) url: String,
    pub(crate) config: PumpConfig,
    pub(crate) headers: HeaderMap,
    pub(crate) state: Arc<PumpState>,
    pub(crate) write_end: Arc<WriteEnd>,
}

impl Worker {
    /// Runs the fetch-and-forward loop to completion on the current thread.
    ///
    /// Never returns an error: the outcome is logged and recorded in the
    /// shared state, and the conduit write end is closed on every path,
    /// including a panic.
    #[instrument(name = "stream_pump", skip(self), fields(url = %self.url))]
    pub(crate) fn run(self) {
        let _cleanup = Cleanup {
            state: &self.state,
            write_end: &self.write_end,
        };

        let result = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.pump()),
            Err(e) => Err(PumpError::Runtime(e)),
        };

        let exit = self.report(result);
        self.state.record_exit(exit);
    }

    async fn pump(&self) -> Result<PumpExit, PumpError> {
        let url = Url::parse(&self.url).map_err(|_| PumpError::InvalidUrl {
            url: self.url.clone(),
        })?;

        info!("HTTP reader connecting");
        let client = build_client(&self.config).map_err(|source| PumpError::Client { source })?;
        let request = client.get(url).headers(self.headers.clone()).send();

        let response = tokio::select! {
            biased;
            () = self.state.shutdown_requested() => return Ok(PumpExit::Stopped),
            result = request => result.map_err(|e| PumpError::from_reqwest(&self.url, e))?,
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PumpError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        info!("HTTP reader connected, streaming data");
        let chunk_size = self.config.chunk_size();
        let mut body = response.bytes_stream();

        // Returning drops the body stream and the client, closing the connection.
        loop {
            if !self.state.is_running() {
                return Ok(PumpExit::Stopped);
            }

            let next = tokio::select! {
                biased;
                () = self.state.shutdown_requested() => return Ok(PumpExit::Stopped),
                next = body.next() => next,
            };
            let Some(received) = next else {
                return Ok(PumpExit::Ended);
            };
            let received = received.map_err(|e| PumpError::from_reqwest(&self.url, e))?;

            if let Some(exit) = forward(&self.state, &received, chunk_size, |piece| {
                self.write_end.write_chunk(piece)
            }) {
                return Ok(exit);
            }
        }
    }

    /// Logs the outcome at the severity its class calls for.
    fn report(&self, result: Result<PumpExit, PumpError>) -> PumpExit {
        match result {
            Ok(exit) => {
                let stats = self.state.stats();
                info!(?exit, chunks = stats.chunks, bytes = stats.bytes, "HTTP stream ended");
                exit
            }
            Err(PumpError::Connect { source, .. }) => {
                let detail = render_error_chain(&source);
                if is_dns_error(&source) {
                    self.state.mark_dns_failure();
                    error!(error = %detail, "HTTP reader DNS resolution failed");
                    PumpExit::DnsFailure
                } else {
                    error!(error = %detail, "HTTP reader connection error");
                    PumpExit::ConnectionFailed
                }
            }
            Err(PumpError::HttpStatus { status, .. }) => {
                error!(status, "HTTP reader got non-success status");
                PumpExit::HttpStatus(status)
            }
            Err(e @ (PumpError::Request { .. } | PumpError::InvalidUrl { .. })) => {
                warn!(error = %render_error_chain(&e), "HTTP reader request error");
                PumpExit::RequestFailed
            }
            Err(e @ (PumpError::Client { .. } | PumpError::Runtime(_))) => {
                error!(error = ?e, "HTTP reader unexpected error");
                PumpExit::Unexpected
            }
        }
    }
}

/// Writes one body chunk as pieces of at most `chunk_size` bytes.
///
/// Returns the exit when forwarding has to end; an empty chunk writes nothing.
fn forward(
    state: &PumpState,
    received: &[u8],
    chunk_size: usize,
    mut write: impl FnMut(&[u8]) -> io::Result<()>,
) -> Option<PumpExit> {
    for piece in received.chunks(chunk_size) {
        if !state.is_running() {
            return Some(PumpExit::Stopped);
        }
        if let Err(e) = write(piece) {
            if !state.is_running() {
                return Some(PumpExit::Stopped);
            }
            warn!(error = %e, "conduit write failed, reader went away");
            return Some(PumpExit::ReaderGone);
        }
        let count = state.record_chunk(piece.len());
        if count % PROGRESS_LOG_INTERVAL == 0 {
            debug!(chunks = count, "HTTP reader streamed chunks");
        }
    }
    None
}

/// Runs on every exit path of [`Worker::run`], unwinding included.
struct Cleanup<'a> {
    state: &'a PumpState,
    write_end: &'a WriteEnd,
}

impl Drop for Cleanup<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!("HTTP reader panicked");
            self.state.record_exit(PumpExit::Unexpected);
        }
        self.state.mark_stopped();
        if self.write_end.close() {
            debug!("closed conduit write end");
        }
    }
}
