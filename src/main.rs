//! CLI entry point for the stream pump.

use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stream_pump::{StreamPump, contains_dns_error_phrase};
use tracing::{debug, info, warn};

mod cli;
mod progress;

use cli::{Args, EXIT_DNS_FAILURE, exit_code_for};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(args.default_log_level()));

    // stdout may carry the stream itself, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    if args.scan_stderr {
        return scan_diagnostics(io::stdin().lock());
    }

    let url = args.url.clone().context("a stream URL is required")?;
    relay(&args, url).await
}

/// Relays the stream to the requested sink and maps the outcome to an exit code.
async fn relay(args: &Args, url: String) -> Result<ExitCode> {
    let pump = Arc::new(
        StreamPump::with_config(url, args.pump_config()).context("invalid pump settings")?,
    );

    let sink: Box<dyn Write + Send> = match &args.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let reader = pump.start().context("failed to start stream pump")?;
    info!(url = %pump.url(), "relaying stream");

    let show_spinner = args.output.is_some() && !args.quiet && io::stderr().is_terminal();
    let (spinner, spinner_stop) = progress::spawn_progress_ui(show_spinner, Arc::clone(&pump));

    let mut copy = tokio::task::spawn_blocking(move || copy_stream(reader, sink));
    let copied = tokio::select! {
        result = &mut copy => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping stream pump");
            stop_pump(&pump).await;
            copy.await
        }
    };

    stop_pump(&pump).await;
    progress::finish_progress_ui(spinner, &spinner_stop).await;

    let bytes = copied
        .context("stream copy task failed")?
        .context("failed to write stream output")?;

    let exit = pump.last_exit();
    info!(bytes, ?exit, dns_failure = pump.dns_failure(), "relay finished");
    Ok(ExitCode::from(exit_code_for(exit)))
}

/// Copies the pipe to `sink` until end-of-data.
fn copy_stream(mut reader: io::PipeReader, mut sink: Box<dyn Write + Send>) -> io::Result<u64> {
    let bytes = io::copy(&mut reader, &mut sink)?;
    sink.flush()?;
    Ok(bytes)
}

/// Runs the (briefly blocking) stop off the async worker threads.
async fn stop_pump(pump: &Arc<StreamPump>) {
    let pump = Arc::clone(pump);
    if let Err(e) = tokio::task::spawn_blocking(move || pump.stop()).await {
        warn!(error = %e, "stream pump stop task failed");
    }
}

/// Prints each input line that looks like a DNS failure.
///
/// Exits with the DNS exit code when any line matched.
fn scan_diagnostics(input: impl BufRead) -> Result<ExitCode> {
    let mut stdout = io::stdout().lock();
    let mut matched = 0_usize;
    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read diagnostics from stdin")?;
        if contains_dns_error_phrase(&line) {
            matched += 1;
            writeln!(stdout, "{}: {line}", index + 1).context("failed to write match")?;
        }
    }
    info!(matched, "diagnostic scan finished");
    Ok(if matched > 0 {
        ExitCode::from(EXIT_DNS_FAILURE)
    } else {
        ExitCode::SUCCESS
    })
}
