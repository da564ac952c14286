//! community-ai CLI - local administration of the community engagement store

mod commands;

use clap::{Args, Parser, Subcommand};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "community-ai")]
#[command(version)]
#[command(about = "Community engagement store - users, weekly challenges, responses and metric snapshots")]
#[command(long_about = r#"
community-ai keeps the community_ai relational store:
  • users and their activity flags
  • weekly challenges (engagement, retention, sales, reactivation)
  • responses submitted to challenges
  • metric snapshots recorded per challenge

Example usage:
  community-ai init
  community-ai seed
  community-ai challenge add --week 5 --title "Share your morning routine"
  community-ai response add --user 1 --challenge 1 --content "Time-box the inbox"
  community-ai summary
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print the schema DDL
    Schema,

    /// Load the seed dataset into an empty store
    Seed,

    /// Show row counts per table
    Stats,

    /// Show per-goal totals and metric averages
    Summary,

    /// Dump every table as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage challenges
    #[command(subcommand)]
    Challenge(ChallengeCommand),

    /// Manage responses
    #[command(subcommand)]
    Response(ResponseCommand),

    /// Manage metric snapshots
    #[command(subcommand)]
    Metric(MetricCommand),
}

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user
    Add {
        #[arg(short, long)]
        username: String,

        /// Register as inactive
        #[arg(long)]
        inactive: bool,

        /// Registration time (defaults to now)
        #[arg(long, value_parser = parse_timestamp)]
        joined_at: Option<DateTime<Utc>>,
    },

    /// Show a user and their latest answers
    Show {
        id: i64,

        /// Number of recent answers to include
        #[arg(long, default_value = "20")]
        answers: usize,
    },

    /// List users
    List {
        /// Only active users
        #[arg(long)]
        active: bool,

        /// Only users with this username
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Mark a user active
    Activate { id: i64 },

    /// Mark a user inactive
    Deactivate { id: i64 },

    /// Record activity for a user
    Touch {
        id: i64,

        /// Activity time (defaults to now)
        #[arg(long, value_parser = parse_timestamp, conflicts_with = "clear")]
        at: Option<DateTime<Utc>>,

        /// Clear last_active instead
        #[arg(long)]
        clear: bool,
    },

    /// Delete a user without responses
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ChallengeCommand {
    /// Create a challenge
    Add {
        #[arg(short, long)]
        week: i64,

        /// Goal label (defaults to the goal of the week; engagement outside weeks 1-4)
        #[arg(short, long)]
        goal: Option<String>,

        #[arg(short, long)]
        title: String,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show a challenge with its responses and latest metric snapshot
    Show { id: i64 },

    /// List challenges
    List {
        #[arg(short, long)]
        week: Option<i64>,

        #[arg(short, long)]
        goal: Option<String>,
    },

    /// Delete a challenge without responses or metrics
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum ResponseCommand {
    /// Record a response
    Add {
        /// Responding user id
        #[arg(short, long)]
        user: Option<i64>,

        /// Challenge id
        #[arg(short = 'C', long)]
        challenge: Option<i64>,

        #[arg(long)]
        content: Option<String>,
    },

    /// Show a response
    Show { id: i64 },

    /// List responses
    List {
        #[arg(short = 'C', long)]
        challenge: Option<i64>,

        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Delete a response
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum MetricCommand {
    /// Record a metric snapshot
    Add(MetricArgs),

    /// Show a metric snapshot
    Show { id: i64 },

    /// List snapshots, oldest analysis first
    List {
        #[arg(short = 'C', long)]
        challenge: Option<i64>,
    },

    /// Show the most recent snapshot of a challenge
    Latest {
        #[arg(short = 'C', long)]
        challenge: i64,
    },

    /// Delete a metric snapshot
    Delete { id: i64 },
}

#[derive(Args)]
pub struct MetricArgs {
    #[arg(short = 'C', long)]
    pub challenge: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    pub completion_rate: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub engagement_score: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub sales_conversion: Option<f64>,

    #[arg(long, allow_hyphen_values = true)]
    pub reactivation_rate: Option<f64>,

    /// Analysis time (defaults to now)
    #[arg(long, value_parser = parse_timestamp)]
    pub analyzed_at: Option<DateTime<Utc>>,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if raw.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }
    community_ai::storage::time::decode(raw)
        .ok_or_else(|| format!("invalid timestamp '{}' (expected e.g. 2024-05-01 09:30:00 or RFC 3339)", raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Successful result envelope for JSON mode
pub fn envelope(command: &str, data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    })
}

/// Print a successful result envelope in JSON mode
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        println!("{}", serde_json::to_string_pretty(&envelope(command, data))?);
    }
    Ok(())
}

fn emit_error(output_mode: OutputMode, err: &anyhow::Error) {
    match output_mode {
        OutputMode::Json => {
            let envelope = serde_json::json!({
                "ok": false,
                "error": format!("{:#}", err),
            });
            println!("{}", envelope);
        }
        OutputMode::Human => community_ai::ui::error(&format!("{:#}", err)),
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging; stderr keeps JSON output on stdout clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(err) = run(cli, output_mode) {
        emit_error(output_mode, &err);
        std::process::exit(1);
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let config = community_ai::config::load_config(cli.config.as_deref())?.unwrap_or_default();
    let ctx = commands::Context {
        output_mode,
        database: config.database_path(cli.database.as_deref()),
        config_path: cli.config.unwrap_or_else(community_ai::config::default_config_path),
        config,
    };

    match cli.command {
        Commands::Init { force } => commands::run_init(&ctx, force),
        Commands::Schema => commands::run_schema(&ctx),
        Commands::Seed => commands::run_seed(&ctx),
        Commands::Stats => commands::run_stats(&ctx),
        Commands::Summary => commands::run_summary(&ctx),
        Commands::Export { output } => commands::run_export(&ctx, output.as_deref()),
        Commands::User(cmd) => commands::run_user(&ctx, cmd),
        Commands::Challenge(cmd) => commands::run_challenge(&ctx, cmd),
        Commands::Response(cmd) => commands::run_response(&ctx, cmd),
        Commands::Metric(cmd) => commands::run_metric(&ctx, cmd),
    }
}
