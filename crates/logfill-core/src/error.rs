//! Error types for logfill.
//!
//! Steady-state emission never propagates these past the loop that produced
//! them: synthesis and delivery failures are logged and counted. Only
//! configuration and readiness errors reach the binary.

use std::time::Duration;

/// Serializing a synthesized event failed.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("could not encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single delivery attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Connection, timeout or other transport-level failure.
    #[error("could not send request: {0}")]
    Transport(#[from] reqwest::Error),

    /// The destination answered with a non-2xx status.
    #[error("destination returned {status}")]
    Status { status: reqwest::StatusCode },

    /// Writing to a local stream failed.
    #[error("could not write payload: {0}")]
    Io(#[from] std::io::Error),

    /// The sink refused the payload for a reason of its own.
    #[error("payload rejected: {0}")]
    Rejected(String),
}

/// The destination never became ready during startup.
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    #[error("timed out after {waited:?} waiting for {url} to respond")]
    TimedOut { url: String, waited: Duration },
}

/// Invalid process configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
