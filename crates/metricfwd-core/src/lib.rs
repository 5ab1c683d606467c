//! metricfwd core: metric containers, metric variants, and the registry.
//!
//! This crate owns the write side (`Collector::add`, `gauge`, `histogram`,
//! `set`, `snapshot`) and the read side (`get_metrics`, `get_metrics_keys`)
//! of the in-process registry. The JSON produced by `get_metrics` is the wire
//! contract consumed by forwarders. It carries no runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Fallible paths
//! surface as `MetricsError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collect;
pub mod error;

/// Shared result type.
pub use error::{ErrorCode, MetricsError, Result};
pub use collect::{Collector, MetricKind, SimpleCollector};
