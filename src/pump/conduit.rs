//! The OS pipe connecting the pump worker to the caller.
//!
//! The read end is handed to the caller as a plain [`PipeReader`]. The write
//! end is wrapped in [`WriteEnd`] so that both the worker and `stop()` can
//! close it, and closing twice is a no-op.

use std::io::{self, PipeReader, PipeWriter, Write};
use std::sync::{Mutex, PoisonError, TryLockError};

/// Creates a conduit, returning the caller's read end and the shared write end.
pub(crate) fn conduit() -> io::Result<(PipeReader, WriteEnd)> {
    let (reader, writer) = io::pipe()?;
    Ok((reader, WriteEnd::new(writer)))
}

/// Write end of the conduit with an idempotent close.
///
/// The mutex is held for the duration of a write. A blocked write (full pipe,
/// slow reader) therefore keeps `try_close` from closing underneath it.
#[derive(Debug)]
pub(crate) struct WriteEnd {
    inner: Mutex<Option<PipeWriter>>,
}

impl WriteEnd {
    fn new(writer: PipeWriter) -> Self {
        Self {
            inner: Mutex::new(Some(writer)),
        }
    }

    /// Writes the whole chunk, blocking while the pipe is full.
    ///
    /// Fails with [`io::ErrorKind::BrokenPipe`] once the end is closed or the
    /// reader has gone away.
    pub(crate) fn write_chunk(&self, chunk: &[u8]) -> io::Result<()> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_mut() {
            Some(writer) => writer.write_all(chunk),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "conduit write end already closed",
            )),
        }
    }

    /// Closes the write end. Returns `true` if this call closed it.
    pub(crate) fn close(&self) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // Dropping the writer closes the descriptor; close errors are ignored.
        guard.take().is_some()
    }

    /// Closes the write end unless a write currently holds it.
    ///
    /// Returns `None` when a write is in progress, otherwise whether this call
    /// closed it.
    pub(crate) fn try_close(&self) -> Option<bool> {
        match self.inner.try_lock() {
            Ok(mut guard) => Some(guard.take().is_some()),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().take().is_some()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}
