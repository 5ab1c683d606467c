//! Metric variants and their aggregation rules.

use std::fmt;

use super::value::{Aggregate, Data, Float, FloatSlice, StringSet};

/// Closed set of metric kinds. Fixed per key once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Set,
    Snapshot,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Set => "set",
            MetricKind::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percentile reported by histograms.
pub const HISTOGRAM_PERCENTILE: f64 = 0.95;

/// Minimum number of samples for percentile interpolation.
const MIN_PERCENTILE_SIZE: usize = 2;

/// One registry entry: a kind tag plus its own synchronized container.
#[derive(Debug)]
pub enum Metric {
    Counter(Float),
    Gauge(Float),
    Histogram(FloatSlice),
    Set(StringSet),
    Snapshot(StringSet),
}

impl Metric {
    pub fn counter() -> Self {
        Metric::Counter(Float::default())
    }

    pub fn gauge() -> Self {
        Metric::Gauge(Float::default())
    }

    pub fn histogram() -> Self {
        Metric::Histogram(FloatSlice::new())
    }

    pub fn set() -> Self {
        Metric::Set(StringSet::new())
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Set(_) => MetricKind::Set,
            Metric::Snapshot(_) => MetricKind::Snapshot,
        }
    }

    /// Build the aggregated view for `key`. Recomputed on every call.
    pub fn aggregate(&self, key: &str) -> Aggregate {
        let mut agg = Aggregate::new();
        match self {
            Metric::Counter(v) | Metric::Gauge(v) => {
                agg.insert(key.to_owned(), Data::Float(v.get()));
            }
            Metric::Set(v) | Metric::Snapshot(v) => {
                agg.insert(key.to_owned(), Data::Strings(v.sorted()));
            }
            Metric::Histogram(v) => {
                // every statistic reads the same sorted, locked view
                let sorted = v.sorted();
                let stats = HistogramStats::from_sorted(&sorted);
                drop(sorted);
                agg.insert(format!("{key}.count"), Data::Float(stats.count));
                agg.insert(format!("{key}.avg"), Data::Float(stats.avg));
                agg.insert(format!("{key}.max"), Data::Float(stats.max));
                agg.insert(format!("{key}.median"), Data::Float(stats.median));
                agg.insert(format!("{key}.95percentile"), Data::Float(stats.p95));
            }
        }
        agg
    }
}

/// Derived histogram statistics over an ascending sample sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramStats {
    pub count: f64,
    pub avg: f64,
    pub max: f64,
    pub median: f64,
    pub p95: f64,
}

impl HistogramStats {
    /// `sorted` must be ascending.
    pub fn from_sorted(sorted: &[f64]) -> Self {
        Self {
            count: sorted.len() as f64,
            avg: average(sorted),
            max: sorted.last().copied().unwrap_or(0.0),
            median: median(sorted),
            p95: percentile(sorted, HISTOGRAM_PERCENTILE),
        }
    }
}

/// Arithmetic mean; 0 for an empty sequence.
fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Element at `len / 2` (upper-middle for even lengths, not averaged).
fn median(sorted: &[f64]) -> f64 {
    sorted.get(sorted.len() / 2).copied().unwrap_or(0.0)
}

/// Linear interpolation between closest ranks (R-7 quantile).
///
/// Returns 0 when `p >= 1` or fewer than two samples are present.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if p >= 1.0 || sorted.len() < MIN_PERCENTILE_SIZE {
        return 0.0;
    }
    let r = 1.0 + (sorted.len() - 1) as f64 * p;
    let lo = r.floor();
    let hi = r.ceil();
    // ranks are 1-based
    let (Some(s_lo), Some(s_hi)) = (
        sorted.get(lo as usize - 1),
        sorted.get(hi as usize - 1),
    ) else {
        return 0.0;
    };
    s_lo + (r - lo) * (s_hi - s_lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_histogram_is_all_zero() {
        let stats = HistogramStats::from_sorted(&[]);
        assert_eq!(stats.count, 0.0);
        assert_eq!(stats.avg, 0.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.median, 0.0);
        assert_eq!(stats.p95, 0.0);
    }

    #[test]
    fn median_takes_upper_middle() {
        assert_eq!(median(&[1.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 3.0);
    }

    #[test]
    fn percentile_interpolates() {
        assert!(approx(percentile(&[1.0, 2.0], 0.95), 1.95));
        assert!(approx(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.5), 3.0));
        assert_eq!(percentile(&[1.0, 2.0], 1.0), 0.0);
        assert_eq!(percentile(&[7.0], 0.5), 0.0);
    }

    #[test]
    fn histogram_aggregate_has_five_sub_keys() {
        let m = Metric::histogram();
        if let Metric::Histogram(v) = &m {
            v.push(5.0);
        }
        let agg = m.aggregate("h");
        let keys: Vec<&str> = agg.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["h.95percentile", "h.avg", "h.count", "h.max", "h.median"]);
        assert_eq!(agg["h.95percentile"], Data::Float(0.0));
        assert_eq!(agg["h.median"], Data::Float(5.0));
    }

    #[test]
    fn kind_names() {
        assert_eq!(Metric::counter().kind().to_string(), "counter");
        assert_eq!(MetricKind::Snapshot.as_str(), "snapshot");
    }
}
