//! Delivery sinks
//!
//! A sink accepts one serialized event and reports whether it got through.
//! Delivery is fire-and-forget: callers log and count failures, nothing is
//! retried or persisted.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::DeliveryError;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError>;
}

/// POSTs each payload to a document endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .tcp_nodelay(true)
            .build()?;
        Ok(Self::with_client(client, url))
    }

    /// Reuse an existing client, e.g. the one used for readiness polling.
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        let url = url.into();
        info!(url = %url, "HTTP sink configured");
        Self { client, url }
    }
}

#[async_trait]
impl DeliverySink for HttpSink {
    fn name(&self) -> &str {
        "http"
    }

    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        // Dropping the response releases the connection back to the pool.
        drop(response);

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status { status })
        }
    }
}

/// Writes each payload as one line on stdout.
pub struct StdoutSink {
    out: Mutex<tokio::io::Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliverySink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
        // One lock per line keeps concurrent workers from interleaving output.
        let mut out = self.out.lock().await;
        out.write_all(&payload).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Keeps every payload it is given.
    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) payloads: StdMutex<Vec<Bytes>>,
    }

    impl RecordingSink {
        pub(crate) fn taken(&self) -> Vec<Bytes> {
            self.payloads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliverySink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, payload: Bytes) -> Result<(), DeliveryError> {
            self.payloads.lock().unwrap().push(payload);
            Ok(())
        }
    }

    /// Rejects everything, counting attempts.
    #[derive(Default)]
    pub(crate) struct FailingSink {
        pub(crate) attempts: AtomicUsize,
    }

    #[async_trait]
    impl DeliverySink for FailingSink {
        fn name(&self) -> &str {
            "failing"
        }

        async fn deliver(&self, _payload: Bytes) -> Result<(), DeliveryError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Err(DeliveryError::Rejected("sink is down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_http_sink_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let sink = HttpSink::new(format!("http://{addr}/test/_doc/"), Duration::from_secs(2))
            .unwrap();
        let err = sink.deliver(Bytes::from_static(b"{}")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }

    #[tokio::test]
    async fn test_stdout_sink_accepts_payload() {
        let sink = StdoutSink::new();
        assert!(sink.deliver(Bytes::from_static(b"{\"ok\":true}")).await.is_ok());
        assert_eq!(sink.name(), "stdout");
    }
}
