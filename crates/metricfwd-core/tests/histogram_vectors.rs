//! Histogram aggregation vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use metricfwd_core::collect::metric::{Metric, MetricKind};
use metricfwd_core::{Collector, SimpleCollector};

mod vector_loader;

#[test]
fn histogram_vectors() {
    let files = [
        "histogram_single.json",
        "histogram_pair.json",
        "histogram_mixed.json",
        "histogram_empty.json",
    ];

    for f in files {
        let v = vector_loader::load(f);
        let m = Metric::histogram();
        let Metric::Histogram(samples) = &m else {
            panic!("histogram constructor returned {:?}", m.kind());
        };
        for s in &v.samples {
            samples.push(*s);
        }

        let agg = m.aggregate("h");
        assert_eq!(agg.len(), 5, "vector={}", v.description);
        for (sub_key, want) in &v.expect {
            let data = agg.get(sub_key).expect("missing sub-key");
            let mut got = String::new();
            data.write_json(&mut got);
            assert_eq!(&got, want, "vector={} sub_key={}", v.description, sub_key);
        }
    }
}

#[test]
fn histogram_json_is_sorted_by_sub_key() {
    let c = SimpleCollector::new();
    for s in vector_loader::load("histogram_mixed.json").samples {
        c.histogram("h", s);
    }
    assert_eq!(c.kind_of("h"), Some(MetricKind::Histogram));

    let got = String::from_utf8(c.get_metrics("h").unwrap()).unwrap();
    assert_eq!(
        got,
        r#"{"h.95percentile":26.5,"h.avg":10.4,"h.count":10.0,"h.max":40.0,"h.median":10.0}"#
    );
}

#[test]
fn histogram_aggregation_is_repeatable() {
    let c = SimpleCollector::new();
    for s in [3.0, 1.0, 2.0] {
        c.histogram("lat", s);
    }
    let first = c.get_metrics("lat").unwrap();
    let second = c.get_metrics("lat").unwrap();
    assert_eq!(first, second);

    c.histogram("lat", 0.5);
    let third = String::from_utf8(c.get_metrics("lat").unwrap()).unwrap();
    assert!(third.contains(r#""lat.count":4.0"#), "{third}");
    assert!(third.contains(r#""lat.max":3.0"#), "{third}");
}
