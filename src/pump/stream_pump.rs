//! The caller-facing pump handle.

use std::io::PipeReader;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use reqwest::header::HeaderMap;
use tracing::{debug, error, info, instrument, warn};

use super::conduit::{WriteEnd, conduit};
use super::config::PumpConfig;
use super::constants::WORKER_THREAD_NAME;
use super::error::{ConfigError, StartError};
use super::state::{PumpExit, PumpState, PumpStats};
use super::worker::Worker;

/// Relays an HTTP byte stream into an OS pipe from a background thread.
///
/// [`start`](Self::start) returns the pipe's read end; read it like any other
/// byte source until end-of-data. The worker closes the write end however the
/// run ends, so a reader never blocks forever on a dead source.
///
/// Failures never surface as errors after `start()` returns. The caller
/// learns about them from the stream ending early, [`dns_failure`](Self::dns_failure),
/// [`last_exit`](Self::last_exit), and the logs.
///
/// There is no reconnect. To retry, create or restart a pump.
///
/// # Example
///
/// ```no_run
/// use std::io::Read;
/// use stream_pump::StreamPump;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pump = StreamPump::new("http://example.com/live.ts");
/// let mut reader = pump.start()?;
///
/// let mut buf = [0u8; 8192];
/// let n = reader.read(&mut buf)?;
/// println!("first read: {n} bytes");
///
/// pump.stop();
/// if pump.dns_failure() {
///     println!("host does not resolve, skipping source");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StreamPump {
    url: String,
    config: PumpConfig,
    headers: HeaderMap,
    control: Mutex<Control>,
}

/// Latest run's state plus the handles of a run not yet stopped.
#[derive(Debug)]
struct Control {
    state: Arc<PumpState>,
    run: Option<RunHandle>,
}

#[derive(Debug)]
struct RunHandle {
    write_end: Arc<WriteEnd>,
    thread: JoinHandle<()>,
    /// Disconnects when the worker thread exits.
    done: mpsc::Receiver<()>,
}

impl StreamPump {
    /// Creates a pump for `url` with default settings.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let config = PumpConfig::default();
        let headers = HeaderMap::new();
        Self::from_parts(url.into(), config, headers)
    }

    /// Creates a pump for `url` with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn with_config(url: impl Into<String>, config: PumpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let headers = config.request_headers()?;
        Ok(Self::from_parts(url.into(), config, headers))
    }

    fn from_parts(url: String, config: PumpConfig, headers: HeaderMap) -> Self {
        Self {
            url,
            config,
            headers,
            control: Mutex::new(Control {
                state: Arc::new(PumpState::default()),
                run: None,
            }),
        }
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Settings this pump runs with.
    #[must_use]
    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Opens the conduit, launches the worker and returns the read end.
    ///
    /// Returns immediately; connecting happens on the worker thread. The read
    /// end belongs to the caller and is never closed by the pump.
    ///
    /// # Errors
    ///
    /// - [`StartError::AlreadyRunning`] if the previous run has not finished
    ///   (call [`stop`](Self::stop) first)
    /// - [`StartError::Conduit`] if the pipe cannot be created
    /// - [`StartError::Spawn`] if the worker thread cannot be spawned
    #[instrument(skip(self), fields(url = %self.url))]
    pub fn start(&self) -> Result<PipeReader, StartError> {
        let mut control = self.lock_control();
        if control.state.is_running() {
            return Err(StartError::AlreadyRunning {
                url: self.url.clone(),
            });
        }
        if let Some(finished) = control.run.take() {
            reap(finished);
        }

        let (reader, write_end) = conduit().map_err(StartError::Conduit)?;
        let write_end = Arc::new(write_end);
        let state = Arc::new(PumpState::running());
        let worker = Worker {
            url: self.url.clone(),
            config: self.config.clone(),
            headers: self.headers.clone(),
            state: Arc::clone(&state),
            write_end: Arc::clone(&write_end),
        };

        let (done_tx, done) = mpsc::channel::<()>();
        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _done = done_tx;
                worker.run();
            })
            .map_err(|e| {
                state.mark_stopped();
                StartError::Spawn(e)
            })?;

        control.state = state;
        control.run = Some(RunHandle {
            write_end,
            thread,
            done,
        });

        info!("started HTTP stream reader thread");
        Ok(reader)
    }

    /// Stops the current run. Idempotent and infallible.
    ///
    /// Clears the running flag, wakes the worker so it drops the in-flight
    /// response and client, closes the conduit write end unless a write is
    /// in progress (the worker then closes it), and waits up to the
    /// configured stop wait for the worker thread. After that bound the
    /// worker is left to finish on its own.
    ///
    /// A few chunks may still be forwarded after this is called. Safe to call
    /// before `start()`, after the run ended by itself, and repeatedly.
    #[instrument(skip(self), fields(url = %self.url))]
    pub fn stop(&self) {
        let (state, run) = {
            let mut control = self.lock_control();
            (Arc::clone(&control.state), control.run.take())
        };

        state.request_shutdown();

        let Some(run) = run else {
            debug!("stream pump not running, nothing to stop");
            return;
        };
        info!("stopping HTTP stream reader");

        match run.write_end.try_close() {
            Some(true) => debug!("closed conduit write end"),
            Some(false) => {}
            None => debug!("conduit write in progress, worker will close it"),
        }

        match run.done.recv_timeout(self.config.stop_wait()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => reap(run),
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    wait_ms = self.config.stop_wait().as_millis(),
                    "HTTP reader did not exit in time, detaching"
                );
            }
        }
    }

    /// `true` while the worker is fetching or forwarding.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_control().state.is_running()
    }

    /// `true` if the latest run failed because the host name did not resolve.
    ///
    /// Meaningful once the run has ended (after [`stop`](Self::stop) or after
    /// the reader saw end-of-data).
    #[must_use]
    pub fn dns_failure(&self) -> bool {
        self.lock_control().state.dns_failure()
    }

    /// Chunks and bytes forwarded by the latest run.
    #[must_use]
    pub fn stats(&self) -> PumpStats {
        self.lock_control().state.stats()
    }

    /// How the latest run ended, or `None` if it has not ended yet.
    #[must_use]
    pub fn last_exit(&self) -> Option<PumpExit> {
        self.lock_control().state.exit()
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StreamPump {
    /// Signals the worker without waiting; the thread finishes detached.
    fn drop(&mut self) {
        let control = self.lock_control();
        if control.state.is_running() {
            control.state.request_shutdown();
        }
    }
}

/// Joins a worker that has exited, logging a panic.
fn reap(run: RunHandle) {
    if !run.thread.is_finished() {
        return;
    }
    if let Err(panic) = run.thread.join() {
        let message = panic
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(panic = %message, "HTTP reader thread panicked");
    }
}
