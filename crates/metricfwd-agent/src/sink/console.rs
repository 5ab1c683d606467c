use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncWriteExt, Stdout};

use metricfwd_core::error::Result;

use super::Sink;

/// Standard output, one JSON object per line.
pub struct ConsoleSink {
    out: Stdout,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn write(&mut self, payload: Bytes) -> Result<()> {
        self.out.write_all(&payload).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}
