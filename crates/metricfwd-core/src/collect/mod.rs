//! Metric collection: containers, variants, and the registry.
//!
//! - `value`: lockable containers (`Float`, `FloatSlice`, `StringSet`) and the
//!   JSON rendering of aggregated values.
//! - `metric`: the closed `Metric` sum type and per-kind aggregation,
//!   including histogram statistics.
//! - `registry`: the `Collector` trait and `SimpleCollector`.

pub mod metric;
pub mod registry;
pub mod value;

pub use metric::{HistogramStats, Metric, MetricKind};
pub use registry::{Collector, SimpleCollector};
pub use value::{Aggregate, Data};
