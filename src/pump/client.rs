//! HTTP client construction for a single pump run.

use std::sync::Arc;

use reqwest::Client;

use super::config::PumpConfig;
use crate::dns::PumpResolver;
use crate::user_agent;

/// Builds a client sized for exactly one stream.
///
/// - no automatic retries, so a dead source surfaces immediately and the
///   caller can fail over
/// - at most one idle pooled connection per host
/// - separate connect and read timeouts (no total timeout, the stream is
///   open-ended)
/// - [`PumpResolver`] so DNS failures are recognisable in the error chain
pub(crate) fn build_client(config: &PumpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .retry(reqwest::retry::never())
        .pool_max_idle_per_host(1)
        .connect_timeout(config.connect_timeout())
        .read_timeout(config.read_timeout())
        .dns_resolver(Arc::new(PumpResolver))
        .gzip(true)
        .user_agent(user_agent::default_pump_user_agent())
        .build()
}
