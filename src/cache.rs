use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::Instant;

use crate::metrics::CACHE_SIZE;
use crate::models::{AnalysisRequest, PlanResponse};

// Create a cache key: hash of the canonical JSON payload. serde_json maps
// are ordered by key, so two payloads that differ only in field order
// produce the same fingerprint. The selected model rides along inside the
// payload, so switching models changes the key.
pub fn fingerprint(req: &AnalysisRequest) -> String {
    let canonical = serde_json::to_value(req).unwrap_or(serde_json::Value::Null);
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string());
    format!("{:x}", hasher.finalize())
}

// Cache entry with timestamps. Never mutated after insert, only replaced
// or evicted.
#[derive(Clone)]
pub struct CacheEntry {
    pub value: PlanResponse,
    pub stored_at: DateTime<Utc>,
    expires_at: Instant,
}

// TTL-bound response store. Expired entries behave exactly as absent even
// before a sweep gets to them.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<PlanResponse> {
        // check under the shard guard, purge after releasing it
        match self.entries.get(fingerprint) {
            None => return None,
            Some(entry) if Instant::now() < entry.expires_at => {
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }
        self.entries.remove(fingerprint);
        CACHE_SIZE.set(self.entries.len() as f64);
        None
    }

    pub fn set(&self, fingerprint: String, value: PlanResponse) {
        self.entries.insert(
            fingerprint,
            CacheEntry {
                value,
                stored_at: Utc::now(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        CACHE_SIZE.set(self.entries.len() as f64);
    }

    // Drop every expired entry. Live entries always survive a sweep.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
        CACHE_SIZE.set(self.entries.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModelKind, RosterRequest};
    use tokio::time;

    fn response(text: &str) -> PlanResponse {
        PlanResponse {
            result: text.to_string(),
            agent_type: None,
            route_taken: None,
            model_used: None,
        }
    }

    fn roster_payload(json: &str) -> AnalysisRequest {
        AnalysisRequest::Roster(serde_json::from_str::<RosterRequest>(json).unwrap())
    }

    #[test]
    fn fingerprint_ignores_field_order() {
        let a = roster_payload(
            r#"{"team": "Las Vegas Aces", "season": "2025", "strategy": "championship"}"#,
        );
        let b = roster_payload(
            r#"{"strategy": "championship", "team": "Las Vegas Aces", "season": "2025"}"#,
        );
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn fingerprint_tracks_payload_and_model() {
        let base = RosterRequest {
            team: "Las Vegas Aces".to_string(),
            season: "2025".to_string(),
            strategy: "championship".to_string(),
            priorities: Vec::new(),
            cap_target: None,
            model_type: None,
        };
        let mut other_strategy = base.clone();
        other_strategy.strategy = "rebuild".to_string();
        let mut other_model = base.clone();
        other_model.model_type = Some(ModelKind::Ollama);

        let fp = fingerprint(&AnalysisRequest::Roster(base));
        assert_ne!(fp, fingerprint(&AnalysisRequest::Roster(other_strategy)));
        assert_ne!(fp, fingerprint(&AnalysisRequest::Roster(other_model)));
    }

    #[tokio::test(start_paused = true)]
    async fn get_respects_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(300));
        cache.set("fp".to_string(), response("plan"));

        time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("fp"), Some(response("plan")));

        time::advance(Duration::from_secs(1)).await;
        // exactly at expiry the entry must read as absent
        assert_eq!(cache.get("fp"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set("old".to_string(), response("stale"));
        time::advance(Duration::from_secs(61)).await;
        cache.set("new".to_string(), response("fresh"));

        cache.sweep();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new"), Some(response("fresh")));
        assert_eq!(cache.get("old"), None);
    }
}
