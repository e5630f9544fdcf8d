use clap::{Parser, Subcommand};

use crate::models::ModelKind;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "roster-client")]
#[command(about = "Resilient client for the roster builder backend")]
pub struct Args {
    // Backend base URL
    #[arg(short, long, default_value = "http://localhost:8000")]
    pub backend_url: String,

    // Backend model to route the analysis through
    #[arg(short, long, value_enum, default_value_t = ModelKind::Openai)]
    pub model: ModelKind,

    // Cache TTL in seconds
    #[arg(long, default_value_t = 300)]
    pub cache_ttl: u64,

    // Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub request_timeout: u64,

    // Health probe timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub probe_timeout: u64,

    // Minimum seconds between explicit health refreshes
    #[arg(long, default_value_t = 10)]
    pub refresh_interval: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    // Build a roster plan for a team and season
    Roster {
        #[arg(long)]
        team: String,

        #[arg(long)]
        season: String,

        // Team building strategy, e.g. "championship" or "rebuild"
        #[arg(long)]
        strategy: String,

        #[arg(long)]
        priorities: Vec<String>,

        #[arg(long)]
        cap_target: Option<String>,
    },

    // Plan a trip (legacy form)
    Trip {
        #[arg(long)]
        destination: String,

        #[arg(long)]
        duration: String,

        #[arg(long)]
        budget: Option<String>,

        #[arg(long)]
        interests: Vec<String>,

        #[arg(long)]
        travel_style: Option<String>,
    },
}
