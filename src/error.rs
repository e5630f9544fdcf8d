use thiserror::Error;

/// A required field was empty. Caught before any network activity; the
/// submission slot is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required field: {field}")]
pub struct ValidationError {
    pub field: &'static str,
}

// Failure taxonomy for a submission that made it past validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureKind {
    // no response at all
    #[error("network error")]
    Network,
    // no response within the configured bound
    #[error("request timed out")]
    Timeout,
    // non-2xx status from the backend
    #[error("backend returned HTTP {0}")]
    Http(u16),
    // 2xx body whose result text is a backend-produced error message
    #[error("backend reported an error")]
    Backend,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unknown module: {0}")]
    Unknown(String),
    #[error("module {name} failed to load: {message}")]
    Failed { name: String, message: String },
}
