//! # logfill-core - synthetic log traffic generator
//!
//! Emits randomized structured log events at a varying rate, for exercising
//! log indexing and search front-ends without production data.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────┐      ┌──────────────────┐
//!   │ Rate Scheduler│      │ Payload Synth    │
//!   │ (RateState)   │      │ (Event, Dice)    │
//!   └──────┬────────┘      └────────┬─────────┘
//!          │                        │
//!    ┌─────┴─────────────┬──────────┴───────────┐
//!    ▼                   ▼                      │
//! ┌───────────────┐  ┌───────────────────────┐  │
//! │ LiveEmitter   │  │ BackfillCoordinator   │◄─┘
//! │ wall clock,   │  │ simulated clock going │
//! │ synchronous   │  │ backward to horizon   │
//! └──────┬────────┘  └──────────┬────────────┘
//!        │                      ▼
//!        │              ┌───────────────┐
//!        │              │ WorkerPool    │ bounded queue, N workers
//!        │              └──────┬────────┘
//!        ▼                     ▼
//!   ┌──────────────────────────────────┐
//!   │ DeliverySink (HttpSink/Stdout)   │ fire-and-forget
//!   └──────────────────────────────────┘
//! ```
//!
//! Both emitters honor a shared `CancellationToken`. Failures to serialize
//! or deliver a single event are logged and counted, never propagated.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use logfill_core::{BackfillConfig, BackfillCoordinator, HttpSink};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let sink = Arc::new(HttpSink::new("http://localhost:9200/test/_doc/", Duration::from_secs(10))?);
//! let report = BackfillCoordinator::new(sink, BackfillConfig::default())
//!     .run(chrono::Utc::now(), CancellationToken::new())
//!     .await;
//! println!("delivered {}", report.events.delivered);
//! # Ok(())
//! # }
//! ```

pub mod backfill;
pub mod config;
pub mod error;
pub mod live;
pub mod payload;
pub mod pool;
pub mod readiness;
pub mod scheduler;
pub mod sink;
pub mod stats;

pub use backfill::{BackfillConfig, BackfillCoordinator, BackfillReport, BackfillTimeline};
pub use config::{GeneratorConfig, parse_duration};
pub use error::{ConfigError, DeliveryError, ReadinessError, SynthesisError};
pub use live::LiveEmitter;
pub use payload::{Charge, Dice, Event, Level, Service, Template, synthesize_payload};
pub use pool::WorkerPool;
pub use readiness::wait_for_ready;
pub use scheduler::{Direction, RateState, next_durations};
pub use sink::{DeliverySink, HttpSink, StdoutSink};
pub use stats::{EmitterStats, StatsSnapshot};
