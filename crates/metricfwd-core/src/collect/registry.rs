//! Key -> metric registry.
//!
//! The map itself is a `DashMap` (sharded read/write locks): inserting a new
//! key takes a shard write lock, every other access a shard read lock. The
//! per-metric containers synchronize their own mutations.

use dashmap::DashMap;
use tracing::trace;

use crate::error::{MetricsError, Result};

use super::metric::{Metric, MetricKind};
use super::value::{encode_json, StringSet};

/// Read/write surface of a metrics registry.
pub trait Collector: Send + Sync {
    /// JSON object for one key's aggregated view, sub-keys sorted.
    fn get_metrics(&self, key: &str) -> Result<Vec<u8>>;
    /// All registered keys, ascending.
    fn get_metrics_keys(&self) -> Vec<String>;
    /// Kind bound to `key`, if registered.
    fn kind_of(&self, key: &str) -> Option<MetricKind>;

    /// Counter: additive.
    fn add(&self, key: &str, delta: f64);
    /// Gauge: last write wins.
    fn gauge(&self, key: &str, value: f64);
    /// Histogram: append one sample.
    fn histogram(&self, key: &str, sample: f64);
    /// Set: grow-only string membership.
    fn set(&self, key: &str, value: &str);
    /// Snapshot: replace the whole string membership.
    fn snapshot(&self, key: &str, values: &[&str]);
}

/// In-process `Collector`.
#[derive(Debug, Default)]
pub struct SimpleCollector {
    metrics: DashMap<String, Metric>,
}

impl SimpleCollector {
    pub fn new() -> Self {
        Self {
            metrics: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Create-if-absent, then apply `f` to whatever is stored at `key`.
    fn upsert(&self, key: &str, make: fn() -> Metric, f: impl FnOnce(&Metric)) {
        if !self.metrics.contains_key(key) {
            self.metrics.entry(key.to_owned()).or_insert_with(make);
        }
        if let Some(m) = self.metrics.get(key) {
            f(m.value());
        }
    }
}

fn ignored(key: &str, kind: MetricKind, op: MetricKind) {
    trace!(key = %key, kind = %kind, op = %op, "kind mismatch, write ignored");
}

impl Collector for SimpleCollector {
    fn get_metrics(&self, key: &str) -> Result<Vec<u8>> {
        let m = self.metrics.get(key).ok_or(MetricsError::NotFoundMetrics)?;
        Ok(encode_json(&m.aggregate(key)).into_bytes())
    }

    fn get_metrics_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.metrics.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    fn kind_of(&self, key: &str) -> Option<MetricKind> {
        self.metrics.get(key).map(|m| m.kind())
    }

    fn add(&self, key: &str, delta: f64) {
        self.upsert(key, Metric::counter, |m| match m {
            Metric::Counter(v) => v.add(delta),
            other => ignored(key, other.kind(), MetricKind::Counter),
        });
    }

    fn gauge(&self, key: &str, value: f64) {
        self.upsert(key, Metric::gauge, |m| match m {
            Metric::Gauge(v) => v.set(value),
            other => ignored(key, other.kind(), MetricKind::Gauge),
        });
    }

    fn histogram(&self, key: &str, sample: f64) {
        self.upsert(key, Metric::histogram, |m| match m {
            Metric::Histogram(v) => v.push(sample),
            other => ignored(key, other.kind(), MetricKind::Histogram),
        });
    }

    fn set(&self, key: &str, value: &str) {
        self.upsert(key, Metric::set, |m| match m {
            Metric::Set(v) => v.insert(value),
            other => ignored(key, other.kind(), MetricKind::Set),
        });
    }

    /// Always installs a fresh snapshot, even over a key of another kind.
    /// Snapshots are point-in-time captures, so the latest capture owns the key.
    fn snapshot(&self, key: &str, values: &[&str]) {
        let fresh = Metric::Snapshot(values.iter().collect::<StringSet>());
        if let Some(prev) = self.metrics.insert(key.to_owned(), fresh) {
            if prev.kind() != MetricKind::Snapshot {
                trace!(key = %key, kind = %prev.kind(), "snapshot replaced metric");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn text(c: &SimpleCollector, key: &str) -> String {
        String::from_utf8(c.get_metrics(key).unwrap()).unwrap()
    }

    #[test]
    fn counter_accumulates() {
        let c = SimpleCollector::new();
        c.add("a", 1.0);
        c.add("a", 2.0);
        assert_eq!(text(&c, "a"), r#"{"a":3.0}"#);
    }

    #[test]
    fn gauge_replaces() {
        let c = SimpleCollector::new();
        c.gauge("g", 10.0);
        c.gauge("g", 4.0);
        assert_eq!(text(&c, "g"), r#"{"g":4.0}"#);
    }

    #[test]
    fn first_write_wins() {
        let c = SimpleCollector::new();
        c.add("c", 2.0);
        c.gauge("c", 1.0);
        c.histogram("c", 1.0);
        c.set("c", "x");
        assert_eq!(c.kind_of("c"), Some(MetricKind::Counter));
        assert_eq!(text(&c, "c"), r#"{"c":2.0}"#);
    }

    #[test]
    fn snapshot_overrides_other_kinds() {
        let c = SimpleCollector::new();
        c.add("k", 1.0);
        c.snapshot("k", &["b", "a"]);
        assert_eq!(c.kind_of("k"), Some(MetricKind::Snapshot));
        assert_eq!(text(&c, "k"), r#"{"k":["a","b"]}"#);
    }

    #[test]
    fn missing_key_is_not_found() {
        let c = SimpleCollector::new();
        let err = c.get_metrics("nope").unwrap_err();
        assert_eq!(err.code().as_str(), "NOT_FOUND_METRICS");
        assert!(c.kind_of("nope").is_none());
    }

    #[test]
    fn keys_are_sorted() {
        let c = SimpleCollector::new();
        assert!(c.is_empty());
        c.add("b", 1.0);
        c.set("a", "x");
        c.histogram("c.h", 1.0);
        assert_eq!(c.get_metrics_keys(), vec!["a", "b", "c.h"]);
        assert_eq!(c.len(), 3);
        assert!(!c.is_empty());
    }
}
