use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::debounce::Throttler;
use crate::models::{ModelKind, ModelsHealth};

// Latest known state of one backend. `last_checked` stays None until the
// first probe completes, which is how "stale" is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelAvailability {
    pub backend: ModelKind,
    pub available: bool,
    pub last_checked: Option<DateTime<Utc>>,
}

impl ModelAvailability {
    fn unknown(backend: ModelKind) -> Self {
        Self {
            backend,
            available: false,
            last_checked: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HealthSnapshot {
    pub openai: ModelAvailability,
    pub ollama: ModelAvailability,
}

impl HealthSnapshot {
    pub fn for_backend(&self, backend: ModelKind) -> ModelAvailability {
        match backend {
            ModelKind::Openai => self.openai,
            ModelKind::Ollama => self.ollama,
        }
    }
}

// Polls GET /models/health and keeps a snapshot the UI can read without
// ever blocking on an in-flight probe.
pub struct HealthMonitor {
    client: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
    statuses: DashMap<ModelKind, ModelAvailability>,
    // gates UI-triggered refreshes; a flurry of visibility events yields
    // at most one probe per interval
    refresh_gate: Throttler<()>,
}

impl HealthMonitor {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        probe_timeout: Duration,
        min_refresh_interval: Duration,
    ) -> Self {
        let statuses = DashMap::new();
        statuses.insert(ModelKind::Openai, ModelAvailability::unknown(ModelKind::Openai));
        statuses.insert(ModelKind::Ollama, ModelAvailability::unknown(ModelKind::Ollama));
        Self {
            client,
            base_url,
            probe_timeout,
            statuses,
            refresh_gate: Throttler::new(min_refresh_interval, |_: ()| {
                debug!("health refresh allowed through the guard");
            }),
        }
    }

    // Entry point for host-UI events ("the form became visible"): throttled
    // so repeated triggers collapse into one probe per interval. Returns
    // whether a probe was actually issued.
    pub async fn refresh_throttled(&self) -> bool {
        if !self.refresh_gate.call(()) {
            return false;
        }
        self.refresh().await;
        true
    }

    // One probe, one whole-snapshot commit. A failed or rejected probe
    // marks both backends unavailable rather than leaving a stale value.
    pub async fn refresh(&self) {
        let url = format!("{}/models/health", self.base_url);
        let health = match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(res) if res.status().is_success() => match res.json::<ModelsHealth>().await {
                Ok(health) => health,
                Err(err) => {
                    warn!(error = %err, "health probe returned an unreadable body");
                    ModelsHealth::default()
                }
            },
            Ok(res) => {
                warn!(status = %res.status(), "health probe rejected");
                ModelsHealth::default()
            }
            Err(err) => {
                warn!(error = %err, "health probe failed");
                ModelsHealth::default()
            }
        };

        let checked = Utc::now();
        self.commit(ModelKind::Openai, health.openai, checked);
        self.commit(ModelKind::Ollama, health.ollama, checked);
    }

    fn commit(&self, backend: ModelKind, available: bool, checked: DateTime<Utc>) {
        let was = self.statuses.get(&backend).map(|status| status.available);
        self.statuses.insert(
            backend,
            ModelAvailability {
                backend,
                available,
                last_checked: Some(checked),
            },
        );
        // log transitions only, like a good health checker should
        if was != Some(available) {
            if available {
                info!(%backend, "backend is now available");
            } else {
                info!(%backend, "backend is now unavailable");
            }
        }
    }

    pub fn availability(&self, backend: ModelKind) -> ModelAvailability {
        self.statuses
            .get(&backend)
            .map(|status| *status)
            .unwrap_or_else(|| ModelAvailability::unknown(backend))
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            openai: self.availability(ModelKind::Openai),
            ollama: self.availability(ModelKind::Ollama),
        }
    }
}

// Re-probe on a cadence. Host UIs call `refresh` directly on their own
// lifecycle events; this loop just keeps the snapshot from going stale.
pub async fn poll_loop(monitor: Arc<HealthMonitor>, check_interval: Duration) {
    let mut ticker = interval(check_interval);
    info!(?check_interval, "health poller started");
    loop {
        ticker.tick().await;
        monitor.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_stale_until_first_probe() {
        let monitor = HealthMonitor::new(
            reqwest::Client::new(),
            "http://localhost:8000".to_string(),
            Duration::from_secs(5),
            Duration::from_secs(10),
        );
        let snapshot = monitor.snapshot();
        assert!(!snapshot.openai.available);
        assert!(!snapshot.ollama.available);
        assert_eq!(snapshot.openai.last_checked, None);
        assert_eq!(snapshot.ollama.last_checked, None);
    }

    #[test]
    fn commit_records_check_time() {
        let monitor = HealthMonitor::new(
            reqwest::Client::new(),
            "http://localhost:8000".to_string(),
            Duration::from_secs(5),
            Duration::from_secs(10),
        );
        let checked = Utc::now();
        monitor.commit(ModelKind::Openai, true, checked);

        let status = monitor.availability(ModelKind::Openai);
        assert!(status.available);
        assert_eq!(status.last_checked, Some(checked));
        // the other backend is untouched
        assert_eq!(monitor.availability(ModelKind::Ollama).last_checked, None);
    }
}
