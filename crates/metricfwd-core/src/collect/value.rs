//! Self-synchronized metric containers and their serializable views.
//!
//! Each container owns its own `RwLock`, so writers to different keys never
//! contend beyond the registry lookup. Serialization is hand-rolled because
//! numbers must render with exactly one fractional digit (`5` -> `5.0`),
//! which `serde_json` does not guarantee.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Mutable scalar used by counters and gauges.
#[derive(Debug, Default)]
pub struct Float {
    v: RwLock<f64>,
}

impl Float {
    /// Additive update (counters).
    pub fn add(&self, delta: f64) {
        *self.v.write() += delta;
    }

    /// Replacing update (gauges).
    pub fn set(&self, value: f64) {
        *self.v.write() = value;
    }

    pub fn get(&self) -> f64 {
        *self.v.read()
    }
}

/// Append-only sample sequence used by histograms.
#[derive(Debug, Default)]
pub struct FloatSlice {
    v: RwLock<Vec<f64>>,
}

impl FloatSlice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, sample: f64) {
        self.v.write().push(sample);
    }

    /// Sort in place, then hand back a shared view of the sorted samples.
    ///
    /// The write guard is downgraded atomically, so no append can land
    /// between the sort and the reads done through the returned guard.
    pub fn sorted(&self) -> RwLockReadGuard<'_, Vec<f64>> {
        let mut guard = self.v.write();
        guard.sort_by(f64::total_cmp);
        RwLockWriteGuard::downgrade(guard)
    }
}

/// Deduplicating string collection used by sets and snapshots.
#[derive(Debug, Default)]
pub struct StringSet {
    v: RwLock<HashSet<String>>,
}

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert.
    pub fn insert(&self, s: &str) {
        let mut set = self.v.write();
        if !set.contains(s) {
            set.insert(s.to_owned());
        }
    }

    pub fn len(&self) -> usize {
        self.v.read().len()
    }

    /// Members in ascending lexicographic order (never insertion order).
    pub fn sorted(&self) -> Vec<String> {
        let mut out: Vec<String> = self.v.read().iter().cloned().collect();
        out.sort();
        out
    }
}

impl<S: AsRef<str>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            v: RwLock::new(iter.into_iter().map(|s| s.as_ref().to_owned()).collect()),
        }
    }
}

/// One serializable value of an aggregated view.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Float(f64),
    Strings(Vec<String>),
}

impl Data {
    /// Append the JSON rendering of this value to `out`.
    pub fn write_json(&self, out: &mut String) {
        match self {
            Data::Float(f) => {
                let _ = write!(out, "{:.1}", f);
            }
            Data::Strings(list) => {
                out.push('[');
                for (i, s) in list.iter().enumerate() {
                    if i != 0 {
                        out.push(',');
                    }
                    write_quoted(s, out);
                }
                out.push(']');
            }
        }
    }
}

/// Aggregated view of one metric: derived sub-key -> value.
///
/// `BTreeMap` keeps sub-keys lexicographically ordered so the rendered JSON
/// is byte-reproducible.
pub type Aggregate = BTreeMap<String, Data>;

/// Render an aggregated view as one JSON object.
pub fn encode_json(agg: &Aggregate) -> String {
    let mut out = String::with_capacity(agg.len() * 24 + 2);
    out.push('{');
    for (i, (k, v)) in agg.iter().enumerate() {
        if i != 0 {
            out.push(',');
        }
        write_quoted(k, &mut out);
        out.push(':');
        v.write_json(&mut out);
    }
    out.push('}');
    out
}

fn write_quoted(s: &str, out: &mut String) {
    let _ = write!(out, "{}", serde_json::Value::from(s));
}
