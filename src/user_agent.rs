//! Default User-Agent for pump HTTP requests.

/// Default User-Agent when the caller configures none (identifies the tool).
#[must_use]
pub(crate) fn default_pump_user_agent() -> String {
    format!("stream-pump/{}", env!("CARGO_PKG_VERSION"))
}
