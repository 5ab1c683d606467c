use std::time::Duration;

use serde::Deserialize;
use metricfwd_core::error::{MetricsError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    #[serde(default)]
    pub forward: ForwardSection,

    /// Keys forwarded besides the agent's own metrics. Unregistered keys are
    /// skipped with a warning.
    #[serde(default)]
    pub metrics: Vec<String>,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MetricsError::UnsupportedVersion);
        }
        if self.metrics.iter().any(|k| k.is_empty()) {
            return Err(MetricsError::BadConfig("metrics keys must not be empty".into()));
        }

        self.forward.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    #[default]
    Console,
    Udp,
}

impl Destination {
    pub fn as_str(self) -> &'static str {
        match self {
            Destination::Console => "console",
            Destination::Udp => "udp",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardSection {
    #[serde(default)]
    pub destination: Destination,

    /// Peer address (`host:port`), udp only.
    #[serde(default)]
    pub addr: Option<String>,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ForwardSection {
    fn default() -> Self {
        Self {
            destination: Destination::default(),
            addr: None,
            interval_ms: default_interval_ms(),
        }
    }
}

impl ForwardSection {
    pub fn validate(&self) -> Result<()> {
        if !(10..=3_600_000).contains(&self.interval_ms) {
            return Err(MetricsError::BadConfig(
                "forward.interval_ms must be between 10 and 3600000".into(),
            ));
        }
        match (self.destination, self.addr.as_deref()) {
            (Destination::Udp, None) | (Destination::Udp, Some("")) => Err(MetricsError::BadConfig(
                "forward.addr is required for udp destination".into(),
            )),
            (Destination::Console, Some(_)) => Err(MetricsError::BadConfig(
                "forward.addr is only valid for udp destination".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_interval_ms() -> u64 {
    1000
}
