use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use metricfwd_core::error::{MetricsError, Result};
use metricfwd_core::Collector;

use crate::config::{Destination, ForwardSection};
use crate::sink::{ConsoleSink, Sink, UdpSink};

use super::merge::merged_metrics;
use super::stream::{self, ActiveStream, StreamHandle};

/// Flush interval used when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Forwards subscribed registry keys to one sink.
///
/// All methods take `&self`; share it as `Arc<MetricsWriter>` between the
/// periodic stream and manual `flush` callers. Writes to the sink are
/// serialized, so concurrent flushes never interleave partial payloads.
pub struct MetricsWriter {
    source: Arc<dyn Collector>,
    destination: Mutex<Box<dyn Sink>>,
    keys: RwLock<Vec<String>>,
    interval: Duration,
    streams: Arc<AtomicUsize>,
}

impl MetricsWriter {
    pub fn builder() -> MetricsWriterBuilder {
        MetricsWriterBuilder::default()
    }

    /// Writer over `source` flushing into `sink` every `DEFAULT_INTERVAL`.
    pub fn new(source: Arc<dyn Collector>, sink: impl Sink + 'static) -> Self {
        Self::from_parts(source, Box::new(sink), DEFAULT_INTERVAL)
    }

    /// Writer flushing to standard output.
    pub fn console(source: Arc<dyn Collector>) -> Self {
        Self::new(source, ConsoleSink::new())
    }

    /// Writer flushing one datagram per flush to `addr`.
    pub async fn udp(source: Arc<dyn Collector>, addr: &str) -> Result<Self> {
        Ok(Self::new(source, UdpSink::connect(addr).await?))
    }

    /// Writer for a validated `forward` config section.
    pub async fn from_config(source: Arc<dyn Collector>, cfg: &ForwardSection) -> Result<Self> {
        let builder = Self::builder().source(source).interval(cfg.interval());
        let builder = match (cfg.destination, cfg.addr.as_deref()) {
            (Destination::Console, _) => builder.destination(ConsoleSink::new()),
            (Destination::Udp, Some(addr)) => builder.destination(UdpSink::connect(addr).await?),
            (Destination::Udp, None) => {
                return Err(MetricsError::BadConfig(
                    "forward.addr is required for udp destination".into(),
                ))
            }
        };
        builder.build()
    }

    fn from_parts(source: Arc<dyn Collector>, sink: Box<dyn Sink>, interval: Duration) -> Self {
        Self {
            source,
            destination: Mutex::new(sink),
            keys: RwLock::new(Vec::new()),
            interval,
            streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn source(&self) -> &Arc<dyn Collector> {
        &self.source
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Swap the sink. Waits for an in-flight write to finish first.
    pub async fn set_destination(&self, sink: impl Sink + 'static) {
        let mut dest = self.destination.lock().await;
        debug!(from = dest.name(), to = sink.name(), "destination replaced");
        *dest = Box::new(sink);
    }

    /// Current subscription list, ascending.
    pub fn metrics_keys(&self) -> Vec<String> {
        self.keys.read().clone()
    }

    /// Subscribe `keys`. All of them must be registered in the source;
    /// otherwise nothing is added and `UnknownMetric` names the first miss.
    ///
    /// Duplicates are kept: subscribing the same key twice emits it twice.
    pub fn add_metrics<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        if let Some(missing) = keys
            .iter()
            .map(|k| k.as_ref())
            .find(|k| self.source.kind_of(k).is_none())
        {
            return Err(MetricsError::UnknownMetric(missing.to_owned()));
        }

        let mut subscribed = self.keys.write();
        subscribed.extend(keys.iter().map(|k| k.as_ref().to_owned()));
        subscribed.sort();
        debug!(added = keys.len(), total = subscribed.len(), "metrics subscribed");
        Ok(())
    }

    /// Subscribe the subset of `keys` registered in the source and return
    /// the keys that are not registered, in input order.
    pub fn add_registered_metrics<S: AsRef<str>>(&self, keys: &[S]) -> Vec<String> {
        let (known, missing): (Vec<&str>, Vec<&str>) = keys
            .iter()
            .map(|k| k.as_ref())
            .partition(|k| self.source.kind_of(k).is_some());
        if !known.is_empty() {
            let mut subscribed = self.keys.write();
            subscribed.extend(known.iter().map(|k| (*k).to_owned()));
            subscribed.sort();
        }
        missing.into_iter().map(str::to_owned).collect()
    }

    /// Unsubscribe `keys`. Keys that are not subscribed are ignored.
    pub fn remove_metrics<S: AsRef<str>>(&self, keys: &[S]) {
        let mut subscribed = self.keys.write();
        subscribed.retain(|k| !keys.iter().any(|r| r.as_ref() == k));
    }

    /// Write the merged subscribed metrics to the sink.
    pub async fn flush(&self) -> Result<()> {
        let keys = self.metrics_keys();
        self.write_merged(&keys).await
    }

    /// Write the merged metrics of an ad hoc key list; subscriptions are untouched.
    pub async fn flush_with_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        self.write_merged(keys).await
    }

    async fn write_merged<S: AsRef<str>>(&self, keys: &[S]) -> Result<()> {
        let payload = merged_metrics(self.source.as_ref(), keys)?;
        let mut dest = self.destination.lock().await;
        dest.write(payload).await
    }

    /// Start the periodic flush task. At most one runs per writer.
    ///
    /// The task stops once `token` is cancelled; no flush starts after that.
    pub fn run_stream(self: &Arc<Self>, token: CancellationToken) -> Result<StreamHandle> {
        let rt = tokio::runtime::Handle::try_current()
            .map_err(|e| MetricsError::Internal(format!("no tokio runtime: {e}")))?;
        if self
            .streams
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MetricsError::StreamRunning);
        }

        let active = ActiveStream::new(Arc::clone(&self.streams));
        let join = rt.spawn(stream::run(Arc::clone(self), token.clone(), active));
        Ok(StreamHandle::new(token, join))
    }

    /// Number of periodic tasks currently running (0 or 1).
    pub fn active_streams(&self) -> usize {
        self.streams.load(Ordering::Acquire)
    }
}

/// Builder for `MetricsWriter`.
#[derive(Default)]
pub struct MetricsWriterBuilder {
    source: Option<Arc<dyn Collector>>,
    destination: Option<Box<dyn Sink>>,
    interval: Option<Duration>,
}

impl MetricsWriterBuilder {
    pub fn source(mut self, source: Arc<dyn Collector>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn destination(mut self, sink: impl Sink + 'static) -> Self {
        self.destination = Some(Box::new(sink));
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Fails with `InvalidSource` without a source. The destination defaults
    /// to the console.
    pub fn build(self) -> Result<MetricsWriter> {
        let source = self.source.ok_or(MetricsError::InvalidSource)?;
        let interval = self.interval.unwrap_or(DEFAULT_INTERVAL);
        if interval.is_zero() {
            return Err(MetricsError::BadConfig("flush interval must be positive".into()));
        }
        let sink = self
            .destination
            .unwrap_or_else(|| Box::new(ConsoleSink::new()) as Box<dyn Sink>);
        Ok(MetricsWriter::from_parts(source, sink, interval))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::sink::BufferSink;
    use metricfwd_core::SimpleCollector;

    fn writer_with_keys(keys: &[&str]) -> MetricsWriter {
        let c = SimpleCollector::new();
        for k in keys {
            c.add(k, 1.0);
        }
        MetricsWriter::new(Arc::new(c), BufferSink::new())
    }

    #[test]
    fn add_metrics_sorts_and_is_all_or_nothing() {
        let w = writer_with_keys(&["a", "b", "c"]);

        let none: [&str; 0] = [];
        w.add_metrics(&none).unwrap();
        assert!(w.metrics_keys().is_empty());

        w.add_metrics(&["b", "a"]).unwrap();
        assert_eq!(w.metrics_keys(), vec!["a", "b"]);

        let err = w.add_metrics(&["c", "d"]).unwrap_err();
        assert_eq!(err.code().as_str(), "UNKNOWN_METRIC");
        assert_eq!(w.metrics_keys(), vec!["a", "b"]);
    }

    #[test]
    fn add_registered_metrics_skips_unknown() {
        let w = writer_with_keys(&["a", "b"]);
        w.add_metrics(&["b"]).unwrap();

        let missing = w.add_registered_metrics(&["z", "a", "y"]);
        assert_eq!(missing, vec!["z", "y"]);
        assert_eq!(w.metrics_keys(), vec!["a", "b"]);

        let none: [&str; 0] = [];
        assert!(w.add_registered_metrics(&none).is_empty());
        assert_eq!(w.metrics_keys(), vec!["a", "b"]);
    }

    #[test]
    fn remove_metrics_ignores_unknown() {
        let w = writer_with_keys(&["a", "b", "c"]);
        w.add_metrics(&w.source().get_metrics_keys()).unwrap();

        let none: [&str; 0] = [];
        w.remove_metrics(&none);
        assert_eq!(w.metrics_keys(), vec!["a", "b", "c"]);
        w.remove_metrics(&["a"]);
        assert_eq!(w.metrics_keys(), vec!["b", "c"]);
        w.remove_metrics(&["c", "d"]);
        assert_eq!(w.metrics_keys(), vec!["b"]);
    }

    #[test]
    fn builder_requires_source() {
        let err = MetricsWriter::builder()
            .destination(BufferSink::new())
            .build()
            .err()
            .unwrap();
        assert_eq!(err.code().as_str(), "INVALID_SOURCE");
    }

    #[test]
    fn builder_defaults() {
        let w = MetricsWriter::builder()
            .source(Arc::new(SimpleCollector::new()))
            .build()
            .unwrap();
        assert_eq!(w.interval(), DEFAULT_INTERVAL);
        assert_eq!(w.active_streams(), 0);
    }

    #[test]
    fn run_stream_needs_runtime() {
        let w = Arc::new(writer_with_keys(&["a"]));
        let err = w.run_stream(CancellationToken::new()).err().unwrap();
        assert_eq!(err.code().as_str(), "INTERNAL");
        assert_eq!(w.active_streams(), 0);
    }
}
