//! Forwarding of registry contents to a sink.
//!
//! A `MetricsWriter` keeps a sorted subscription list over one `Collector`.
//! `flush` merges the per-key JSON objects into a single object and writes it
//! in one `Sink::write` call; `run_stream` repeats that on a fixed interval
//! until its cancellation token fires.

mod merge;
mod stream;
mod writer;

pub use merge::merged_metrics;
pub use stream::StreamHandle;
pub use writer::{MetricsWriter, MetricsWriterBuilder, DEFAULT_INTERVAL};
