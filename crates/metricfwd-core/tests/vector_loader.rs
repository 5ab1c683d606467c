//! JSON test vector loader for histogram tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HistogramVector {
    pub description: String,
    pub samples: Vec<f64>,
    /// Expected sub-key -> rendered number.
    pub expect: BTreeMap<String, String>,
}

pub fn load(name: &str) -> HistogramVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
