//! metricfwd agent
//!
//! Loads `metricfwd.yaml` (or the path given as first argument), records the
//! agent's own health metrics, and forwards them together with any configured
//! key that is registered, on the configured interval until Ctrl-C.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use metricfwd_agent::{config, MetricsWriter};
use metricfwd_core::{Collector, Result, SimpleCollector};

const HEARTBEAT: &str = "metricfwd.heartbeat";
const UPTIME: &str = "metricfwd.uptime_secs";
const TICK_LAG: &str = "metricfwd.tick_lag_ms";
const INSTANCES: &str = "metricfwd.instances";
const DESTINATION: &str = "metricfwd.destination";
const SELF_METRICS: [&str; 5] = [HEARTBEAT, UPTIME, TICK_LAG, INSTANCES, DESTINATION];

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "metricfwd.yaml".into());
    let cfg = config::load_from_file(&path)?;

    let collector = Arc::new(SimpleCollector::new());
    let started = Instant::now();
    collector.add(HEARTBEAT, 0.0);
    collector.gauge(UPTIME, 0.0);
    collector.histogram(TICK_LAG, 0.0);
    collector.set(INSTANCES, &std::process::id().to_string());
    let dest = cfg.forward.destination.as_str();
    collector.snapshot(DESTINATION, &[dest]);

    let writer = Arc::new(MetricsWriter::from_config(collector.clone(), &cfg.forward).await?);
    writer.add_metrics(&SELF_METRICS)?;
    let extra: Vec<&String> = cfg
        .metrics
        .iter()
        .filter(|k| !SELF_METRICS.contains(&k.as_str()))
        .collect();
    for key in writer.add_registered_metrics(&extra) {
        tracing::warn!(key = %key, "configured metric not registered, not forwarded");
    }

    let token = CancellationToken::new();
    let stream = writer.run_stream(token.clone())?;
    tracing::info!(config = %path, destination = %dest, keys = ?writer.metrics_keys(), "metricfwd-agent started");

    let mut beat = tokio::time::interval(Duration::from_secs(1));
    let mut last = Instant::now();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = beat.tick() => {
                let now = Instant::now();
                let lag = now.duration_since(last).saturating_sub(Duration::from_secs(1));
                last = now;
                collector.add(HEARTBEAT, 1.0);
                collector.gauge(UPTIME, started.elapsed().as_secs_f64());
                collector.histogram(TICK_LAG, lag.as_secs_f64() * 1000.0);
            }
        }
    }

    token.cancel();
    stream.wait().await?;
    if let Err(e) = writer.flush().await {
        tracing::warn!(error = %e, "final flush failed");
    }
    tracing::info!("metricfwd-agent stopped");
    Ok(())
}
