use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use metricfwd_core::error::{MetricsError, Result};

use super::writer::MetricsWriter;

/// Marks one running periodic task; released when the task ends.
pub(super) struct ActiveStream(Arc<AtomicUsize>);

impl ActiveStream {
    /// `counter` must already account for this task.
    pub(super) fn new(counter: Arc<AtomicUsize>) -> Self {
        Self(counter)
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Control handle for a running `MetricsWriter::run_stream` task.
pub struct StreamHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl StreamHandle {
    pub(super) fn new(token: CancellationToken, join: JoinHandle<()>) -> Self {
        Self { token, join }
    }

    /// Request the task to stop. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to end without cancelling it.
    pub async fn wait(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| MetricsError::Internal(format!("stream task failed: {e}")))
    }

    /// Cancel, then wait for the task to end.
    pub async fn shutdown(self) -> Result<()> {
        self.cancel();
        self.wait().await
    }
}

pub(super) async fn run(writer: Arc<MetricsWriter>, token: CancellationToken, active: ActiveStream) {
    let _active = active;
    let period = writer.interval();
    let mut tick = interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(?period, "metrics stream started");
    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = tick.tick() => {
                // a blocked sink must not delay shutdown
                let flushed = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    r = writer.flush() => r,
                };
                match flushed {
                    Ok(()) => {}
                    Err(MetricsError::NotFoundMetrics) => {
                        debug!("no subscribed metric registered yet");
                    }
                    Err(e) => {
                        warn!(error = %e, code = e.code().as_str(), "periodic flush failed");
                    }
                }
            }
        }
    }
    info!("metrics stream stopped");
}
