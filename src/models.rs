use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

// The two inference backends behind the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Openai,
    Ollama,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Openai => write!(f, "openai"),
            ModelKind::Ollama => write!(f, "ollama"),
        }
    }
}

// POST /build-roster request format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterRequest {
    pub team: String,
    pub season: String,
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priorities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap_target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelKind>,
}

// POST /plan-trip request format (legacy analog of the roster form)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_style: Option<String>,
}

// Response body shared by both analysis endpoints. `result` is the rendered
// plan text; the rest is routing metadata the backend may omit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
}

// GET /models/health response. A missing key means the backend did not
// report that model at all, which we read as unavailable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ModelsHealth {
    #[serde(default)]
    pub openai: bool,
    #[serde(default)]
    pub ollama: bool,
}

// One submission payload, whichever form it came from.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisRequest {
    Roster(RosterRequest),
    Trip(TripRequest),
}

impl AnalysisRequest {
    pub fn endpoint(&self) -> &'static str {
        match self {
            AnalysisRequest::Roster(_) => "/build-roster",
            AnalysisRequest::Trip(_) => "/plan-trip",
        }
    }

    // Required-field check. Runs before fingerprinting so an invalid payload
    // never reaches the cache or the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
            if value.trim().is_empty() {
                Err(ValidationError { field })
            } else {
                Ok(())
            }
        }

        match self {
            AnalysisRequest::Roster(req) => {
                required("team", &req.team)?;
                required("season", &req.season)?;
                required("strategy", &req.strategy)
            }
            AnalysisRequest::Trip(req) => {
                required("destination", &req.destination)?;
                required("duration", &req.duration)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(team: &str, season: &str, strategy: &str) -> AnalysisRequest {
        AnalysisRequest::Roster(RosterRequest {
            team: team.to_string(),
            season: season.to_string(),
            strategy: strategy.to_string(),
            priorities: Vec::new(),
            cap_target: None,
            model_type: None,
        })
    }

    #[test]
    fn roster_requires_every_core_field() {
        assert!(roster("Las Vegas Aces", "2025", "championship").validate().is_ok());
        assert_eq!(
            roster("", "2025", "championship").validate(),
            Err(ValidationError { field: "team" })
        );
        assert_eq!(
            roster("Las Vegas Aces", "   ", "championship").validate(),
            Err(ValidationError { field: "season" })
        );
    }

    #[test]
    fn health_missing_keys_read_as_unavailable() {
        let health: ModelsHealth = serde_json::from_str("{}").unwrap();
        assert!(!health.openai);
        assert!(!health.ollama);

        let health: ModelsHealth = serde_json::from_str(r#"{"openai": true}"#).unwrap();
        assert!(health.openai);
        assert!(!health.ollama);
    }

    #[test]
    fn model_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ModelKind::Openai).unwrap(), r#""openai""#);
        assert_eq!(serde_json::to_string(&ModelKind::Ollama).unwrap(), r#""ollama""#);
    }

    #[test]
    fn plan_response_tolerates_missing_metadata() {
        let body: PlanResponse = serde_json::from_str(r#"{"result": "draft a center"}"#).unwrap();
        assert_eq!(body.result, "draft a center");
        assert_eq!(body.agent_type, None);
        assert_eq!(body.route_taken, None);
    }
}
