//! State shared between the caller and the worker of one pump run.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

/// How the latest pump run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The server finished the body.
    Ended,
    /// `stop()` (or dropping the pump) ended the run.
    Stopped,
    /// Writing to the conduit failed, usually because the reader went away.
    ReaderGone,
    /// The server answered with a status other than 200.
    HttpStatus(u16),
    /// The host name could not be resolved.
    DnsFailure,
    /// Connecting failed for a reason other than DNS (refused, unreachable, connect timeout).
    ConnectionFailed,
    /// The request failed after or apart from connecting (read timeout, truncated body, bad URL).
    RequestFailed,
    /// Internal failure of the worker itself.
    Unexpected,
}

/// Forwarding counters of the latest pump run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpStats {
    /// Chunks written to the conduit.
    pub chunks: u64,
    /// Bytes written to the conduit.
    pub bytes: u64,
}

/// Flags and counters for one run. Handles are not shared through here.
#[derive(Debug, Default)]
pub(crate) struct PumpState {
    running: AtomicBool,
    dns_failure: AtomicBool,
    chunks: AtomicU64,
    bytes: AtomicU64,
    exit: Mutex<Option<PumpExit>>,
    shutdown: Notify,
}

impl PumpState {
    /// State for a run that is about to start.
    pub(crate) fn running() -> Self {
        let state = Self::default();
        state.running.store(true, Ordering::SeqCst);
        state
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Clears `running` and wakes the worker if it is waiting on the network.
    ///
    /// `notify_one` stores a permit, so a request made while the worker is
    /// busy writing is still seen at its next network wait.
    pub(crate) fn request_shutdown(&self) {
        self.mark_stopped();
        self.shutdown.notify_one();
    }

    /// Completes once shutdown has been requested.
    pub(crate) async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }

    pub(crate) fn dns_failure(&self) -> bool {
        self.dns_failure.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_dns_failure(&self) {
        self.dns_failure.store(true, Ordering::SeqCst);
    }

    /// Counts one forwarded chunk; returns the new chunk total.
    pub(crate) fn record_chunk(&self, len: usize) -> u64 {
        self.bytes.fetch_add(len as u64, Ordering::Relaxed);
        self.chunks.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn stats(&self) -> PumpStats {
        PumpStats {
            chunks: self.chunks.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }

    /// Records the exit once; later calls keep the first value.
    pub(crate) fn record_exit(&self, exit: PumpExit) {
        let mut slot = self.exit.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(exit);
    }

    pub(crate) fn exit(&self) -> Option<PumpExit> {
        *self.exit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_state_starts_running_without_dns_failure() {
        let state = PumpState::running();
        assert!(state.is_running());
        assert!(!state.dns_failure());
        assert_eq!(state.exit(), None);
    }

    #[test]
    fn test_request_shutdown_clears_running() {
        let state = PumpState::running();
        state.request_shutdown();
        assert!(!state.is_running());
    }

    #[test]
    fn test_shutdown_permit_survives_until_awaited() {
        let state = PumpState::running();
        state.request_shutdown();
        // Would hang if the notification were lost.
        tokio_test::block_on(state.shutdown_requested());
    }

    #[test]
    fn test_record_chunk_accumulates() {
        let state = PumpState::running();
        assert_eq!(state.record_chunk(10), 1);
        assert_eq!(state.record_chunk(5), 2);
        assert_eq!(state.stats(), PumpStats { chunks: 2, bytes: 15 });
    }

    #[test]
    fn test_first_exit_wins() {
        let state = PumpState::running();
        state.record_exit(PumpExit::Stopped);
        state.record_exit(PumpExit::Unexpected);
        assert_eq!(state.exit(), Some(PumpExit::Stopped));
    }
}
