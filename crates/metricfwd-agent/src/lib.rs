//! metricfwd agent library entry.
//!
//! This crate wires a `Collector` to a destination: the forwarder
//! (`MetricsWriter`), its sinks (console, in-memory, channel, UDP), the
//! cancellable periodic flush task, and the YAML config that selects them.
//! It is consumed by the binary (`main.rs`) and by integration tests.

pub mod config;
pub mod forward;
pub mod sink;

pub use forward::{MetricsWriter, StreamHandle};
