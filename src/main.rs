use clap::Parser;
use futures::FutureExt;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roster_client::cache::ResponseCache;
use roster_client::config::{Args, Command};
use roster_client::health::HealthMonitor;
use roster_client::lazy::LazyRegistry;
use roster_client::models::{AnalysisRequest, RosterRequest, TripRequest};
use roster_client::orchestrator::{Orchestrator, RequestState};

// Plain-text plan renderer. Loaded through the lazy boundary so the render
// path only becomes resident once there is something to show.
struct Renderer;

impl Renderer {
    fn render(&self, response: &roster_client::models::PlanResponse) -> String {
        let mut out = String::new();
        out.push_str(&response.result);
        if let Some(route) = &response.route_taken {
            out.push_str(&format!("\n\n[route: {route}]"));
        }
        if let Some(model) = &response.model_used {
            out.push_str(&format!("\n[model: {model}]"));
        }
        out
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let client = reqwest::Client::new();

    let cache = Arc::new(ResponseCache::new(Duration::from_secs(args.cache_ttl)));
    let health = Arc::new(HealthMonitor::new(
        client.clone(),
        args.backend_url.clone(),
        Duration::from_secs(args.probe_timeout),
        Duration::from_secs(args.refresh_interval),
    ));
    let orchestrator = Orchestrator::new(
        client,
        args.backend_url.clone(),
        Arc::clone(&cache),
        Duration::from_secs(args.request_timeout),
    );

    // probe before submitting, the way the form does when it becomes visible
    health.refresh_throttled().await;
    let snapshot = health.snapshot();
    info!(
        openai = snapshot.openai.available,
        ollama = snapshot.ollama.available,
        "backend availability"
    );
    if !snapshot.for_backend(args.model).available {
        // degraded status is surfaced, but the backend has the final say
        warn!(model = %args.model, "selected backend looks unavailable; submitting anyway");
    }

    let payload = match args.command {
        Command::Roster {
            team,
            season,
            strategy,
            priorities,
            cap_target,
        } => AnalysisRequest::Roster(RosterRequest {
            team,
            season,
            strategy,
            priorities,
            cap_target,
            model_type: Some(args.model),
        }),
        Command::Trip {
            destination,
            duration,
            budget,
            interests,
            travel_style,
        } => AnalysisRequest::Trip(TripRequest {
            destination,
            duration,
            budget,
            interests,
            travel_style,
        }),
    };

    let renderers: LazyRegistry<Renderer> = LazyRegistry::new();
    renderers.register("results", || async { Ok(Renderer) }.boxed());

    if let Err(err) = orchestrator.submit(payload).await {
        eprintln!("{err}");
        return ExitCode::from(2);
    }

    match orchestrator.state() {
        RequestState::Succeeded { response } => {
            match renderers.require("results").await {
                Ok(renderer) => println!("{}", renderer.render(&response)),
                Err(_) => println!("{}", response.result),
            }
            ExitCode::SUCCESS
        }
        RequestState::Failed { kind, message } => {
            eprintln!("{kind}: {message}");
            ExitCode::FAILURE
        }
        // submit resolves to a terminal state unless something superseded it
        _ => ExitCode::FAILURE,
    }
}
