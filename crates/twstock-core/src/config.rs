use std::time::Duration;

use twstock_warehouse::RouterConfig;

/// Timing knobs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Pause before every outbound request. Exchanges ban clients that skip it.
    pub request_delay: Duration,
    /// Pause between consecutive tasks of a daily run.
    pub stage_delay: Duration,
    pub request_timeout: Duration,
    pub reconnect_backoff: Duration,
    /// `None` retries a lost storage connection forever.
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_secs(5),
            stage_delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
            reconnect_backoff: Duration::from_secs(1),
            max_reconnect_attempts: None,
        }
    }
}

impl PipelineConfig {
    /// No pacing at all, for offline runs against scripted transports.
    pub fn without_delays() -> Self {
        Self {
            request_delay: Duration::ZERO,
            stage_delay: Duration::ZERO,
            reconnect_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn request_timeout_ms(&self) -> u64 {
        u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            backoff: self.reconnect_backoff,
            max_reconnect_attempts: self.max_reconnect_attempts,
        }
    }
}
