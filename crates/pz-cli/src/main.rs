mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::discord::DiscordSubcommand;
use pz_core::config::Config;
use pz_core::types::Outcome;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "protocol-zero",
    about = "Protocol Zero: log cravings, receive penance, climb the leaderboard",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./protocol-zero.yaml if present)
    #[arg(long, global = true, env = "PZ_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API, dashboard and Discord interactions endpoint
    Serve {
        /// Port to listen on (overrides config and PZ_PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Open the dashboard in a browser
        #[arg(long)]
        open: bool,
    },

    /// Report a craving you resisted
    Resist {
        /// Stable user id
        #[arg(long)]
        user: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Confess a relapse and receive a penance
    Relapse {
        /// Stable user id
        #[arg(long)]
        user: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show one user's progression
    Profile { id: String },

    /// Interaction totals
    Stats,

    /// Most recent interactions
    History {
        #[arg(short, long, default_value_t = 5)]
        limit: i64,
    },

    /// Top users by XP
    Leaderboard {
        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },

    /// Interactions per hour of day (UTC)
    Hourly,

    /// Create the database schema if missing
    Migrate,

    /// Discord application setup
    Discord {
        #[command(subcommand)]
        subcommand: DiscordSubcommand,
    },

    /// List Gemini models available to GEMINI_API_KEY
    Models {
        /// Include models that cannot generate text
        #[arg(long)]
        all: bool,
    },
}

fn main() {
    // A missing .env is normal.
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    config.ensure_valid()?;
    let json = cli.json;

    match cli.command {
        Commands::Serve { port, open } => cmd::serve::run(&config, port, open),
        Commands::Resist { user, name } => {
            cmd::judge::run(&config, Outcome::Resisted, &user, name.as_deref(), json)
        }
        Commands::Relapse { user, name } => {
            cmd::judge::run(&config, Outcome::Relapsed, &user, name.as_deref(), json)
        }
        Commands::Profile { id } => cmd::query::profile(&config, &id, json),
        Commands::Stats => cmd::query::stats(&config, json),
        Commands::History { limit } => cmd::query::history(&config, limit, json),
        Commands::Leaderboard { limit } => cmd::query::leaderboard(&config, limit, json),
        Commands::Hourly => cmd::query::hourly(&config, json),
        Commands::Migrate => cmd::migrate::run(&config, json),
        Commands::Discord { subcommand } => cmd::discord::run(&config, subcommand, json),
        Commands::Models { all } => cmd::models::run(&config, all, json),
    }
}
