//! DNS failure classification.
//!
//! Callers need one shared answer to "was this a DNS resolution failure?"
//! across two very different sources:
//!
//! - structured HTTP client errors, where the resolver failure is buried in
//!   the `source()` chain ([`is_dns_error`])
//! - free text from unrelated producers such as a transcoder's stderr
//!   ([`contains_dns_error_phrase`])
//!
//! Both consult the same phrase table, [`DNS_ERROR_PATTERNS`].
//!
//! # Example
//!
//! ```
//! use stream_pump::dns::contains_dns_error_phrase;
//!
//! assert!(contains_dns_error_phrase("curl: (6) Could not resolve host: example.com"));
//! assert!(!contains_dns_error_phrase("Connection reset by peer"));
//! ```

mod classify;
mod resolve;

pub(crate) use classify::render_error_chain;
pub use classify::{DNS_ERROR_PATTERNS, contains_dns_error_phrase, is_dns_error};
pub use resolve::{AddressResolutionError, PumpResolver};
