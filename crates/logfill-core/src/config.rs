//! Generator configuration.
//!
//! Defaults mirror the demo deployment: an Elasticsearch node reachable as
//! `es:9200`, documents indexed into `test`, back-fill disabled.

use std::time::Duration;

use crate::backfill::{BackfillConfig, DEFAULT_HORIZON};
use crate::error::ConfigError;
use crate::pool::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};

pub const DEFAULT_BASE_URL: &str = "http://es:9200/";
pub const DEFAULT_INDEX: &str = "test";
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Longest accepted back-fill window, ten years.
pub const MAX_HORIZON: Duration = Duration::from_secs(10 * 365 * 86_400);

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub index: String,
    /// Replay history alongside live fill.
    pub backfill: bool,
    pub horizon: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
    pub ready_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            index: DEFAULT_INDEX.to_string(),
            backfill: false,
            horizon: DEFAULT_HORIZON,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GeneratorConfig {
    /// `{base}/{index}/_doc/` with single slashes between parts.
    pub fn doc_url(&self) -> String {
        format!(
            "{}/{}/_doc/",
            self.base_url.trim_end_matches('/'),
            self.index.trim_matches('/')
        )
    }

    pub fn backfill_config(&self) -> BackfillConfig {
        BackfillConfig {
            horizon: self.horizon,
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base URL must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.index.trim_matches('/').is_empty() {
            return Err(ConfigError::Invalid("index must not be empty".to_string()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        if self.horizon.is_zero() {
            return Err(ConfigError::Invalid("horizon must be non-zero".to_string()));
        }
        if self.horizon > MAX_HORIZON {
            return Err(ConfigError::Invalid(format!(
                "horizon must be at most {} days, got {:?}",
                MAX_HORIZON.as_secs() / 86_400,
                self.horizon
            )));
        }
        if self.ready_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Parse `250ms`, `30s`, `5m`, `48h`, `2d`, or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    let invalid = |reason: &str| ConfigError::InvalidDuration {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let (digits, unit_ms) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000)
    } else if let Some(n) = s.strip_suffix('d') {
        (n, 86_400_000)
    } else {
        (s, 1_000)
    };

    if digits.is_empty() {
        return Err(invalid("missing number"));
    }
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number with an optional ms/s/m/h/d unit"))?;
    let millis = value
        .checked_mul(unit_ms)
        .ok_or_else(|| invalid("too large"))?;
    Ok(Duration::from_millis(millis))
}
