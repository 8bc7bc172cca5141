//! Resolver used by the pump's HTTP client.
//!
//! The default resolver reports lookup failures as an opaque boxed error, so
//! a resolution failure can only be told apart from a refused connection by
//! its message. [`PumpResolver`] performs the same system lookup but returns
//! [`AddressResolutionError`], which survives in the client error's cause
//! chain and can be found by [`is_dns_error`](super::is_dns_error).

use std::io;
use std::net::SocketAddr;

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use thiserror::Error;
use tracing::debug;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A host name could not be resolved to any socket address.
#[derive(Debug, Error)]
#[error("name resolution failed for {host}: {source}")]
pub struct AddressResolutionError {
    host: String,
    #[source]
    source: io::Error,
}

impl AddressResolutionError {
    /// Creates a resolution error for `host`.
    pub fn new(host: impl Into<String>, source: io::Error) -> Self {
        Self {
            host: host.into(),
            source,
        }
    }

    /// The host name that failed to resolve.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// System resolver (`getaddrinfo` via tokio) that tags failures with
/// [`AddressResolutionError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpResolver;

impl Resolve for PumpResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let addrs = lookup(&host).await.map_err(|e| Box::new(e) as BoxError)?;
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, BoxError>(addrs)
        })
    }
}

/// Resolves `host`; an empty answer counts as a failure.
pub(crate) async fn lookup(host: &str) -> Result<Vec<SocketAddr>, AddressResolutionError> {
    // The connector overwrites the port.
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, 0))
        .await
        .map_err(|e| AddressResolutionError::new(host, e))?
        .collect();

    if addrs.is_empty() {
        return Err(AddressResolutionError::new(
            host,
            io::Error::new(io::ErrorKind::NotFound, "no address associated with hostname"),
        ));
    }

    debug!(host, count = addrs.len(), "resolved host");
    Ok(addrs)
}
