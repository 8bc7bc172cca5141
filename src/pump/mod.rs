//! Background HTTP stream pump.
//!
//! A [`StreamPump`] fetches a URL as a stream on its own thread and writes the
//! body into an OS pipe. The caller reads the pipe's read end with ordinary
//! blocking I/O, the same way it would read a transcoder's stdout.
//!
//! # Features
//!
//! - Streaming GET with separate connect (5s) and read (30s) timeouts
//! - No automatic retries, single pooled connection
//! - Chunks of at most `chunk_size` bytes forwarded verbatim
//! - Cooperative cancellation, backed by dropping the connection on stop
//! - Conduit write end closed on every exit path
//! - DNS resolution failures reported separately from other connection errors
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use stream_pump::{PumpConfig, StreamPump};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PumpConfig::default().with_user_agent("VLC/3.0.20 LibVLC/3.0.20");
//! let pump = StreamPump::with_config("http://example.com/live.ts", config)?;
//!
//! let mut reader = pump.start()?;
//! let mut data = Vec::new();
//! reader.read_to_end(&mut data)?;
//! pump.stop();
//!
//! println!("{} bytes, exit: {:?}", data.len(), pump.last_exit());
//! # Ok(())
//! # }
//! ```

mod client;
mod conduit;
mod config;
pub mod constants;
mod error;
mod state;
mod stream_pump;
mod worker;

pub use config::PumpConfig;
pub use constants::DEFAULT_CHUNK_SIZE;
pub use error::{ConfigError, StartError};
pub use state::{PumpExit, PumpStats};
pub use stream_pump::StreamPump;
