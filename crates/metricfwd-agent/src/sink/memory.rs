//! In-process sinks: shared buffer, channel, and any `AsyncWrite`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use metricfwd_core::error::{MetricsError, Result};

use super::Sink;

/// Appends every payload to a shared in-memory buffer.
///
/// Clones share the same buffer, so a test (or a pull endpoint) can keep one
/// clone and hand the other to a writer.
#[derive(Clone, Default)]
pub struct BufferSink {
    buf: Arc<Mutex<BytesMut>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf.lock())
    }

    /// Drain the buffer.
    pub fn take(&self) -> Bytes {
        self.buf.lock().split().freeze()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }
}

#[async_trait]
impl Sink for BufferSink {
    fn name(&self) -> &'static str {
        "buffer"
    }

    async fn write(&mut self, payload: Bytes) -> Result<()> {
        self.buf.lock().extend_from_slice(&payload);
        Ok(())
    }
}

/// Delivers each payload as one message on a bounded channel.
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    /// Create a sink and the receiver observing its writes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Sink for ChannelSink {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn write(&mut self, payload: Bytes) -> Result<()> {
        self.tx.send(payload).await.map_err(|_| MetricsError::SinkClosed)
    }
}

/// Adapter for any async byte stream (files, pipes, sockets).
pub struct IoSink<W> {
    inner: W,
}

impl<W> IoSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[async_trait]
impl<W> Sink for IoSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "io"
    }

    async fn write(&mut self, payload: Bytes) -> Result<()> {
        self.inner.write_all(&payload).await?;
        self.inner.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn buffer_clones_share_storage() {
        let captured = BufferSink::new();
        let mut sink = captured.clone();
        sink.write(Bytes::from_static(b"{\"a\":1.0}")).await.unwrap();
        sink.write(Bytes::from_static(b"{\"a\":2.0}")).await.unwrap();
        assert_eq!(&captured.contents()[..], b"{\"a\":1.0}{\"a\":2.0}");
        assert_eq!(&captured.take()[..], b"{\"a\":1.0}{\"a\":2.0}");
        assert!(captured.is_empty());
    }

    #[tokio::test]
    async fn channel_reports_closed_receiver() {
        let (mut sink, rx) = ChannelSink::channel(1);
        drop(rx);
        let err = sink.write(Bytes::from_static(b"{}")).await.unwrap_err();
        assert_eq!(err.code().as_str(), "SINK_CLOSED");
    }

    #[tokio::test]
    async fn io_sink_writes_through() {
        let mut sink = IoSink::new(Vec::new());
        sink.write(Bytes::from_static(b"{\"x\":[\"a\"]}")).await.unwrap();
        assert_eq!(sink.into_inner(), b"{\"x\":[\"a\"]}".to_vec());
    }
}
