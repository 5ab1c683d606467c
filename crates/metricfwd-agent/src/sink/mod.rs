//! Flush destinations.
//!
//! Every `Sink::write` receives one complete JSON object. Sinks never split
//! or batch payloads, so a datagram sink emits exactly one datagram per flush.

mod console;
mod memory;
mod udp;

use async_trait::async_trait;
use bytes::Bytes;

use metricfwd_core::error::Result;

pub use console::ConsoleSink;
pub use memory::{BufferSink, ChannelSink, IoSink};
pub use udp::UdpSink;

/// Byte destination written by a `MetricsWriter`.
#[async_trait]
pub trait Sink: Send {
    /// Human readable name used in logs.
    fn name(&self) -> &'static str;
    /// Write one merged payload.
    async fn write(&mut self, payload: Bytes) -> Result<()>;
}
