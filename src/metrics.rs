use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref SUBMIT_TOTAL: Counter =
        register_counter!("roster_client_submits_total", "Total number of submissions").unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("roster_client_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("roster_client_cache_misses_total", "Total cache misses").unwrap();
    pub static ref SUBMIT_LATENCY: Histogram = register_histogram!(
        "roster_client_submit_latency_seconds",
        "Submission latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("roster_client_cache_size", "Current number of items in cache").unwrap();
}
