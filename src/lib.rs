//! Stream Pump Library
//!
//! This library relays a remote HTTP byte stream into an OS pipe so that a
//! consumer can read every producer (HTTP stream, transcoder subprocess, ...)
//! through the same "read bytes from a descriptor" path.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`pump`] - Background fetch-and-forward worker and its control handle
//! - [`dns`] - DNS failure classification for client errors and free text

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod dns;
pub mod pump;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use dns::{AddressResolutionError, contains_dns_error_phrase, is_dns_error};
pub use pump::{
    ConfigError, DEFAULT_CHUNK_SIZE, PumpConfig, PumpExit, PumpStats, StartError, StreamPump,
};
