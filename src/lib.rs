pub mod cache;
pub mod config;
pub mod debounce;
pub mod error;
pub mod health;
pub mod lazy;
pub mod metrics;
pub mod models;
pub mod orchestrator;

pub use cache::{ResponseCache, fingerprint};
pub use debounce::{Debouncer, Throttler};
pub use error::{FailureKind, LoadError, ValidationError};
pub use health::{HealthMonitor, HealthSnapshot, ModelAvailability};
pub use lazy::{LazyRegistry, LoadState};
pub use models::{AnalysisRequest, ModelKind, PlanResponse, RosterRequest, TripRequest};
pub use orchestrator::{Orchestrator, RequestState};
