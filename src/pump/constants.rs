//! Constants for the pump module (timeouts, chunking, shutdown).

use std::time::Duration;

/// Default number of bytes forwarded per conduit write.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Largest accepted chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Default HTTP connect timeout (5 seconds, so dead hosts fail over quickly).
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default HTTP read timeout (30 seconds between body reads).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Accepted range for either timeout, in seconds.
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// How long `stop()` waits for the worker before returning.
pub const STOP_WAIT: Duration = Duration::from_secs(2);

/// Progress is logged every this many forwarded chunks.
pub const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "stream-pump";
