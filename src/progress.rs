//! Progress UI (spinner) while relaying to a file.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use stream_pump::StreamPump;
use tokio::task::JoinHandle;
use tracing::warn;

/// Spawns the spinner when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    pump: Arc<StreamPump>,
) -> (Option<JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = tokio::spawn(run_spinner(pump, Arc::clone(&stop)));
    (Some(handle), stop)
}

/// Signals the spinner to stop and waits for it.
/// Returns false if the spinner task panicked or was cancelled.
pub(crate) async fn finish_progress_ui(handle: Option<JoinHandle<()>>, stop: &AtomicBool) -> bool {
    stop.store(true, Ordering::SeqCst);
    let Some(handle) = handle else {
        return true;
    };
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "progress spinner task failed");
            false
        }
    }
}

async fn run_spinner(pump: Arc<StreamPump>, stop: Arc<AtomicBool>) {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    while !stop.load(Ordering::SeqCst) {
        let stats = pump.stats();
        spinner.set_message(format!(
            "Relaying {} ({} chunks)",
            format_bytes(stats.bytes),
            stats.chunks
        ));
        tokio::time::sleep(Duration::from_millis(120)).await;
    }

    spinner.finish_and_clear();
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
