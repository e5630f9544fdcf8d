use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::cache::{ResponseCache, fingerprint};
use crate::error::{FailureKind, ValidationError};
use crate::metrics::{CACHE_HITS, CACHE_MISSES, SUBMIT_LATENCY, SUBMIT_TOTAL};
use crate::models::{AnalysisRequest, PlanResponse};

// Prefixes the backend embeds in the result text of a 2xx body when one of
// its pipeline steps failed. These are reclassified as failures and kept
// out of the cache.
const BACKEND_ERROR_PREFIXES: &[&str] = &[
    "Analysis error",
    "Roster construction error",
    "Salary cap analysis error",
    "Team chemistry analysis error",
    "Chemistry analysis error",
];

// Client-visible lifecycle of the submission slot. One live value at a
// time, swapped whole.
#[derive(Debug, Clone)]
pub enum RequestState {
    Idle,
    Pending {
        seq: u64,
        started_at: DateTime<Utc>,
    },
    Succeeded {
        response: PlanResponse,
    },
    Failed {
        kind: FailureKind,
        message: String,
    },
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending { .. })
    }
}

// Owns the submit lifecycle: fingerprint, cache consult, bounded network
// call, and committing the outcome to the watch channel. One submission
// slot; a newer submission supersedes an older in-flight one, whose result
// is then discarded.
pub struct Orchestrator {
    client: reqwest::Client,
    base_url: String,
    cache: Arc<ResponseCache>,
    request_timeout: Duration,
    active_seq: AtomicU64,
    // seq check and state swap must happen as one step
    commit_lock: Mutex<()>,
    state_tx: watch::Sender<RequestState>,
}

impl Orchestrator {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        cache: Arc<ResponseCache>,
        request_timeout: Duration,
    ) -> Self {
        let (state_tx, _) = watch::channel(RequestState::Idle);
        Self {
            client,
            base_url,
            cache,
            request_timeout,
            active_seq: AtomicU64::new(0),
            commit_lock: Mutex::new(()),
            state_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> RequestState {
        self.state_tx.borrow().clone()
    }

    /// Run one submission through the slot. Validation failures come back
    /// as `Err` without touching the slot; every other outcome lands in
    /// the watch channel as `Succeeded` or `Failed`.
    pub async fn submit(&self, payload: AnalysisRequest) -> Result<(), ValidationError> {
        payload.validate()?;
        SUBMIT_TOTAL.inc();

        let fp = fingerprint(&payload);
        // claiming a fresh seq invalidates any older in-flight call
        let seq = self.active_seq.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(cached) = self.cache.get(&fp) {
            CACHE_HITS.inc();
            debug!(seq, "serving submission from cache");
            self.commit(seq, RequestState::Succeeded { response: cached });
            return Ok(());
        }
        CACHE_MISSES.inc();

        self.commit(
            seq,
            RequestState::Pending {
                seq,
                started_at: Utc::now(),
            },
        );

        let started = tokio::time::Instant::now();
        let outcome = self.execute(&payload).await;
        SUBMIT_LATENCY.observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(response) => {
                if let Some(prefix) = backend_error_prefix(&response.result) {
                    warn!(prefix, "backend reported a pipeline failure in a 2xx body");
                    self.commit(
                        seq,
                        RequestState::Failed {
                            kind: FailureKind::Backend,
                            message: response.result,
                        },
                    );
                } else if self.commit(
                    seq,
                    RequestState::Succeeded {
                        response: response.clone(),
                    },
                ) {
                    // only a committed success reaches the cache
                    self.cache.set(fp, response);
                } else {
                    debug!(seq, "discarding superseded response");
                }
            }
            Err((kind, message)) => {
                if !self.commit(seq, RequestState::Failed { kind, message }) {
                    debug!(seq, "discarding superseded failure");
                }
            }
        }
        Ok(())
    }

    // Force the slot back to Idle; an in-flight call is left to resolve
    // into the void.
    pub fn reset(&self) {
        let seq = self.active_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.commit(seq, RequestState::Idle);
    }

    async fn execute(&self, payload: &AnalysisRequest) -> Result<PlanResponse, (FailureKind, String)> {
        let url = format!("{}{}", self.base_url, payload.endpoint());

        // one bound over the whole exchange: a backend that returns headers
        // and then stalls the body still counts as a timeout
        let call = async {
            let res = self
                .client
                .post(&url)
                .json(payload)
                .send()
                .await
                .map_err(|err| (FailureKind::Network, err.to_string()))?;

            let status = res.status();
            if !status.is_success() {
                return Err((
                    FailureKind::Http(status.as_u16()),
                    format!("backend returned HTTP {status}"),
                ));
            }

            res.json::<PlanResponse>()
                .await
                .map_err(|err| (FailureKind::Network, format!("invalid response body: {err}")))
        };

        match timeout(self.request_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err((
                FailureKind::Timeout,
                format!("no response within {:?}", self.request_timeout),
            )),
        }
    }

    // Commit an outcome if this submission is still the active one.
    fn commit(&self, seq: u64, next: RequestState) -> bool {
        let _guard = self.commit_lock.lock().expect("commit lock poisoned");
        if self.active_seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        self.state_tx.send_replace(next);
        true
    }
}

fn backend_error_prefix(result: &str) -> Option<&'static str> {
    BACKEND_ERROR_PREFIXES
        .iter()
        .copied()
        .find(|prefix| result.trim_start().starts_with(prefix))
}
