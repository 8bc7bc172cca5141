//! Heuristics that decide whether an error or a line of text is a DNS failure.

use std::error::Error;

use super::resolve::AddressResolutionError;

/// Lower-case phrases emitted by resolvers and media tools when a host name
/// cannot be resolved.
///
/// The list is the union of wordings seen across libc variants, the HTTP
/// client stack and external tools (ffmpeg, VLC, streamlink). New phrasings
/// are appended here; matching is a plain case-insensitive substring test.
pub const DNS_ERROR_PATTERNS: &[&str] = &[
    "name or service not known",
    "temporary failure in name resolution",
    "no address associated with hostname",
    "could not resolve host",
    "could not resolve hostname",
    "getaddrinfo failed",
    "nodename nor servname provided",
    "server name not resolved",
    "name resolution failed",
    "dns_error",
    // VLC
    "resolution of host",
    // Rust std `ToSocketAddrs` / tokio `lookup_host`
    "failed to lookup address information",
];

/// Upper bound on cause-chain length; chains are not finite by construction.
const MAX_CAUSE_DEPTH: usize = 64;

/// Returns `true` if `err` represents a DNS resolution failure.
///
/// The error and its `source()` chain are searched for an
/// [`AddressResolutionError`]. The walk stops when an error (same address
/// and same type) repeats or after a fixed depth, so malformed self-referential chains terminate.
///
/// Without a structured match, the rendered chain (`outer: inner: ...`) is
/// lower-cased and checked against [`DNS_ERROR_PATTERNS`].
#[must_use]
pub fn is_dns_error(err: &(dyn Error + 'static)) -> bool {
    if cause_chain(err).any(|cause| cause.is::<AddressResolutionError>()) {
        return true;
    }

    contains_dns_error_phrase(&render_error_chain(err))
}

/// Renders `err` and its causes as `outer: inner: ...`.
pub(crate) fn render_error_chain(err: &(dyn Error + 'static)) -> String {
    cause_chain(err)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Returns `true` if `text` contains any phrase from [`DNS_ERROR_PATTERNS`],
/// ignoring case.
///
/// Intended for diagnostic output of producers that only report failures as
/// text, for example a stderr line from a transcoding subprocess.
#[must_use]
pub fn contains_dns_error_phrase(text: &str) -> bool {
    let lowered = text.to_lowercase();
    DNS_ERROR_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

/// Iterates `err` followed by its causes, guarding against cycles.
fn cause_chain<'a>(
    err: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    let mut visited: Vec<&'a (dyn Error + 'static)> = Vec::new();
    let mut next = Some(err);

    std::iter::from_fn(move || {
        let current = next.take()?;
        // Address and vtable together: a wrapper holding its cause inline at
        // offset zero shares the cause's address but not its type.
        if visited.len() >= MAX_CAUSE_DEPTH
            || visited.iter().any(|&seen| std::ptr::eq(seen, current))
        {
            return None;
        }
        visited.push(current);
        next = current.source();
        Some(current)
    })
}
