//! Startup readiness polling.
//!
//! The destination (typically a freshly started search cluster) is probed
//! once per second until it answers `200 OK` or the timeout elapses.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::ReadinessError;

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub async fn wait_for_ready(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<(), ReadinessError> {
    let started = Instant::now();
    let deadline = started + timeout;

    while Instant::now() < deadline {
        info!(url, "Waiting for destination to respond");
        tokio::time::sleep(POLL_INTERVAL).await;

        match client.get(url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => {
                info!(url, waited = ?started.elapsed(), "Destination is ready");
                return Ok(());
            }
            Ok(response) => {
                debug!(url, status = %response.status(), "Destination not ready yet");
            }
            Err(e) => {
                debug!(url, error = %e, "Could not reach destination");
            }
        }
    }

    Err(ReadinessError::TimedOut {
        url: url.to_string(),
        waited: started.elapsed(),
    })
}
