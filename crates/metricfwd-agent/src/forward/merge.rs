use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use metricfwd_core::error::{MetricsError, Result};
use metricfwd_core::Collector;

/// Merge the JSON objects of `keys` into one object, in `keys` order.
///
/// Keys missing from the registry are skipped. Fails with `NotFoundMetrics`
/// only when none of the keys resolves.
pub fn merged_metrics<S: AsRef<str>>(source: &dyn Collector, keys: &[S]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(32 * keys.len() + 2);
    let mut found = false;
    buf.put_u8(b'{');
    for key in keys {
        let key = key.as_ref();
        let obj = match source.get_metrics(key) {
            Ok(obj) => obj,
            Err(MetricsError::NotFoundMetrics) => {
                debug!(key = %key, "metric not registered, skipped");
                continue;
            }
            Err(e) => return Err(e),
        };
        let members = strip_braces(&obj);
        if members.is_empty() {
            continue;
        }
        if found {
            buf.put_u8(b',');
        }
        buf.extend_from_slice(members);
        found = true;
    }
    buf.put_u8(b'}');

    if !found {
        return Err(MetricsError::NotFoundMetrics);
    }
    Ok(buf.freeze())
}

fn strip_braces(obj: &[u8]) -> &[u8] {
    obj.strip_prefix(b"{")
        .and_then(|o| o.strip_suffix(b"}"))
        .unwrap_or(obj)
}
