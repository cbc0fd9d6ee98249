//! A process-embedded metrics client. Application threads record counters,
//! gauges, timers and distribution samples with lock-free updates; a
//! background publisher periodically drains every meter and ships the
//! snapshot to an aggregation endpoint using a compact, string-deduplicated
//! wire format.
//!
//! Aggregation happens remotely: the client never keeps history beyond one
//! reporting interval and never retries a failed send. Recording is
//! best-effort telemetry: updates never block and never fail observably.
//!
//! ```no_run
//! use std::time::Duration;
//! use spectator::{Config, Registry};
//!
//! let registry = Registry::new(Config {
//!     uri: "http://localhost:7101/api/v1/publish".into(),
//!     ..Config::default()
//! });
//! registry.start();
//!
//! let requests = registry.counter("server.requests");
//! requests.increment();
//!
//! let latency = registry.timer("server.latency");
//! latency.record(Duration::from_millis(12));
//!
//! registry.stop();
//! ```

mod atomics;
mod config;
mod id;
mod measurement;
mod meters;
mod publisher;
mod registry;
mod transport;
mod wire;

pub use config::Config;
pub use id::{Id, IntoId, Tags};
pub use measurement::Measurement;
pub use meters::{
    Counter, DistributionSummary, Gauge, MaxGauge, Measurements, Meter, MeterType,
    MonotonicCounter, Timer,
};
pub use registry::Registry;
pub use transport::{HttpTransport, Transport};
