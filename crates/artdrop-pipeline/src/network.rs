//! Connection quality monitoring.
//!
//! [`NetworkMonitor`] probes the service health endpoint and classifies the
//! link as fast, slow, or offline. State lives in a `tokio::sync::watch`
//! channel; observers subscribe once and see only actual changes. The
//! session refreshes the monitor before every submission, and the executor
//! reports back when a run aborts on an unreachable service.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use artdrop_core::remote::HealthProbe;
use artdrop_core::UploaderConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionClass {
    Fast,
    /// Reachable, but the health round trip exceeded the slow threshold.
    Slow,
    Offline,
}

/// Last observed link state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkState {
    pub class: ConnectionClass,
    pub latency: Option<Duration>,
}

impl LinkState {
    fn fast() -> Self {
        Self {
            class: ConnectionClass::Fast,
            latency: None,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.class == ConnectionClass::Offline
    }

    pub fn is_slow(&self) -> bool {
        self.class == ConnectionClass::Slow
    }
}

pub struct NetworkMonitor {
    probe: Arc<dyn HealthProbe>,
    slow_threshold: Duration,
    tx: watch::Sender<LinkState>,
}

impl NetworkMonitor {
    /// The link starts out assumed fast; the first refresh corrects it.
    pub fn new(probe: Arc<dyn HealthProbe>, config: &UploaderConfig) -> Self {
        let (tx, _) = watch::channel(LinkState::fast());
        Self {
            probe,
            slow_threshold: config.slow_latency(),
            tx,
        }
    }

    pub fn current(&self) -> LinkState {
        *self.tx.borrow()
    }

    /// Observe state changes. The receiver always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<LinkState> {
        self.tx.subscribe()
    }

    /// Ping the service and reclassify the link.
    pub async fn refresh(&self) -> LinkState {
        let state = match self.probe.ping().await {
            Ok(latency) => {
                let class = if latency > self.slow_threshold {
                    ConnectionClass::Slow
                } else {
                    ConnectionClass::Fast
                };
                LinkState {
                    class,
                    latency: Some(latency),
                }
            }
            Err(err) if err.is_offline() => {
                tracing::warn!(error = %err, "Health probe unreachable");
                LinkState {
                    class: ConnectionClass::Offline,
                    latency: None,
                }
            }
            Err(err) => {
                // The host answered, so the link itself is up.
                tracing::warn!(error = %err, "Health probe returned an error");
                LinkState::fast()
            }
        };
        self.update(state);
        state
    }

    /// Record an offline observation made elsewhere, e.g. an upload request
    /// that failed to connect.
    pub fn report_offline(&self) {
        self.update(LinkState {
            class: ConnectionClass::Offline,
            latency: None,
        });
    }

    fn update(&self, state: LinkState) {
        self.tx.send_if_modified(|current| {
            if *current != state {
                tracing::debug!(
                    from = ?current.class,
                    to = ?state.class,
                    latency_ms = state.latency.map(|l| l.as_millis() as u64),
                    "Link state changed"
                );
                *current = state;
                true
            } else {
                false
            }
        });
    }
}
