use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use trail_core::{Coordinates, QueryStatus};

use crate::location::parse_fix;
use crate::poll::PollSettings;
use crate::session::SessionSettings;
use crate::speech::Voice;

/// Command line and environment configuration. Flags override environment
/// variables, which override the defaults below. A `.env` file is loaded first.
#[derive(Debug, Parser)]
#[command(name = "curiotrail-client")]
#[command(about = "Ask about the place you are standing and hear the answer")]
#[command(version)]
pub struct Cli {
    /// Query endpoint, e.g. http://localhost:8080/api/v1/queries
    #[arg(
        long,
        global = true,
        env = "CURIOTRAIL_API_URL",
        default_value = "http://localhost:8080/api/v1/queries"
    )]
    pub api_url: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a question for each location fix and read the answers aloud
    Watch(WatchArgs),

    /// Print a stored entry as JSON
    Show {
        #[arg(long)]
        id: i64,
    },

    /// Write a response for an entry, as the answering service would
    Respond {
        #[arg(long)]
        id: i64,

        #[arg(long, value_parser = parse_status, default_value = "complete")]
        status: QueryStatus,

        #[arg(long)]
        text: String,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Location fix as "lat,lon"; may be repeated. Reads stdin when omitted.
    #[arg(long = "fix", value_parser = parse_fix)]
    pub fixes: Vec<Coordinates>,

    #[arg(long, env = "QUESTION", default_value = "What is this place?")]
    pub question: String,

    #[arg(long, env = "CONTEXT_TAG", default_value = "trail")]
    pub context_tag: String,

    #[arg(
        long,
        env = "GEOCODER_URL",
        default_value = "https://nominatim.openstreetmap.org"
    )]
    pub geocoder_url: String,

    #[arg(
        long,
        env = "GEOCODER_USER_AGENT",
        default_value = concat!("CurioTrail/", env!("CARGO_PKG_VERSION"))
    )]
    pub geocoder_user_agent: String,

    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 5)]
    pub poll_interval_secs: u64,

    #[arg(long, env = "POLL_MAX_ATTEMPTS", default_value_t = 120)]
    pub poll_max_attempts: u32,

    /// Overall seconds to wait for an answer; 0 disables the limit
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value_t = 600)]
    pub poll_timeout_secs: u64,

    #[arg(long, env = "POLL_MAX_BACKOFF_SECS", default_value_t = 60)]
    pub poll_max_backoff_secs: u64,

    /// Minimum seconds between stdin fixes unless the position moved enough
    #[arg(long, env = "MIN_FIX_INTERVAL_SECS", default_value_t = 10)]
    pub min_fix_interval_secs: u64,

    /// Movement in metres that lets a stdin fix through early
    #[arg(long, env = "MIN_FIX_DISTANCE_M", default_value_t = 10.0)]
    pub min_fix_distance_m: f64,
}

impl Cli {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl WatchArgs {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            question: self.question.clone(),
            context_tag: self.context_tag.clone(),
            poll: PollSettings {
                interval: Duration::from_secs(self.poll_interval_secs.max(1)),
                max_backoff: Duration::from_secs(self.poll_max_backoff_secs.max(1)),
                max_attempts: self.poll_max_attempts.max(1),
                timeout: (self.poll_timeout_secs > 0)
                    .then(|| Duration::from_secs(self.poll_timeout_secs)),
            },
            voice: Voice::default(),
        }
    }

    pub fn min_fix_interval(&self) -> Duration {
        Duration::from_secs(self.min_fix_interval_secs)
    }
}

fn parse_status(input: &str) -> Result<QueryStatus, trail_core::InvalidStatus> {
    input.parse()
}
