//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use stream_pump::pump::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use stream_pump::{DEFAULT_CHUNK_SIZE, PumpConfig, PumpExit};

/// Exit code when the stream host name does not resolve.
pub const EXIT_DNS_FAILURE: u8 = 2;

/// Relay an HTTP stream to stdout or a file.
///
/// The stream is fetched on a background thread and read back through an OS
/// pipe. Exits with 2 when the host name cannot be resolved, so wrappers can
/// skip the source instead of retrying.
#[derive(Parser, Debug)]
#[command(name = "stream-pump")]
#[command(author, version, about)]
pub struct Args {
    /// Stream URL to relay
    #[arg(required_unless_present = "scan_stderr")]
    pub url: Option<String>,

    /// Write the stream to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// User-Agent sent with the request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Extra request header, as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Bytes per pipe write
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// Read timeout in seconds (1-3600)
    #[arg(long, default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Read diagnostic lines from stdin and report those that look like DNS failures
    #[arg(long, conflicts_with = "url")]
    pub scan_stderr: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Maps the arguments onto a pump configuration.
    pub fn pump_config(&self) -> PumpConfig {
        let mut config = PumpConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_connect_timeout_secs(self.connect_timeout)
            .with_read_timeout_secs(self.read_timeout);
        for (name, value) in &self.headers {
            config = config.with_header(name.clone(), value.clone());
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }

    /// Log filter used when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

/// Process exit code for the way the pump run ended.
pub fn exit_code_for(exit: Option<PumpExit>) -> u8 {
    match exit {
        Some(PumpExit::Ended | PumpExit::Stopped) => 0,
        Some(PumpExit::DnsFailure) => EXIT_DNS_FAILURE,
        _ => 1,
    }
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing header name in '{raw}'"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_url_parses_with_defaults() {
        let args = Args::try_parse_from(["stream-pump", "http://example.com/live.ts"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("http://example.com/live.ts"));
        assert_eq!(args.chunk_size, 8192);
        assert_eq!(args.connect_timeout, 5);
        assert_eq!(args.read_timeout, 30);
        assert!(args.headers.is_empty());
        assert!(!args.scan_stderr);
    }

    #[test]
    fn test_cli_url_required_without_scan_mode() {
        let result = Args::try_parse_from(["stream-pump"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_scan_mode_needs_no_url() {
        let args = Args::try_parse_from(["stream-pump", "--scan-stderr"]).unwrap();
        assert!(args.scan_stderr);
        assert!(args.url.is_none());
    }

    #[test]
    fn test_cli_headers_are_repeatable() {
        let args = Args::try_parse_from([
            "stream-pump",
            "http://example.com/live.ts",
            "-H",
            "Referer: https://portal.example/",
            "--header",
            "X-Token:abc",
        ])
        .unwrap();
        assert_eq!(
            args.headers,
            vec![
                ("Referer".to_string(), "https://portal.example/".to_string()),
                ("X-Token".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_cli_header_without_colon_rejected() {
        let result = Args::try_parse_from(["stream-pump", "http://x/", "-H", "no-colon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_timeout_out_of_range_rejected() {
        let result = Args::try_parse_from(["stream-pump", "http://x/", "--read-timeout", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_pump_config_mapping() {
        let args = Args::try_parse_from([
            "stream-pump",
            "http://example.com/live.ts",
            "--user-agent",
            "VLC/3.0.20",
            "--chunk-size",
            "1316",
            "--connect-timeout",
            "3",
        ])
        .unwrap();
        let config = args.pump_config();
        assert_eq!(config.user_agent(), Some("VLC/3.0.20"));
        assert_eq!(config.chunk_size(), 1316);
        assert_eq!(config.connect_timeout(), std::time::Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_verbosity_levels() {
        let args = Args::try_parse_from(["stream-pump", "http://x/", "-vv"]).unwrap();
        assert_eq!(args.default_log_level(), "trace");
        let args = Args::try_parse_from(["stream-pump", "http://x/", "-q"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code_for(Some(PumpExit::Ended)), 0);
        assert_eq!(exit_code_for(Some(PumpExit::Stopped)), 0);
        assert_eq!(exit_code_for(Some(PumpExit::DnsFailure)), EXIT_DNS_FAILURE);
        assert_eq!(exit_code_for(Some(PumpExit::HttpStatus(404))), 1);
        assert_eq!(exit_code_for(None), 1);
    }
}
