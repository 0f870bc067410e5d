use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "questline")]
#[command(about = "Questline - streaks, missions and levels from the command line")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.questline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides settings.database_path)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a qualifying activity for today's streak
    Activity {
        user: String,
    },

    /// Show active missions, generating today's and this week's sets if due
    Missions {
        user: String,
    },

    /// Report progress on every open mission for an action key
    Advance {
        user: String,
        key: String,
        /// Number of occurrences to report
        #[arg(short, long, default_value_t = 1)]
        amount: u32,
    },

    /// Claim the XP reward of a completed mission
    Claim {
        user: String,
        mission_id: String,
    },

    /// Show XP, level and streak
    Profile {
        user: String,
    },

    /// Grant a one-off special mission from the catalog
    Grant {
        user: String,
        key: String,
        /// Days until the mission expires
        #[arg(long, default_value_t = 7)]
        days: i64,
    },

    /// Initialize a new ~/.questline/config.toml configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(cli.config, force);
    }

    let ctx = cli::Context::open(cli.config.as_deref(), cli.db.as_deref(), cli.json)?;

    match cli.command {
        Commands::Activity { user } => cli::activity::activity_command(&ctx, &user)?,
        Commands::Missions { user } => cli::missions::missions_command(&ctx, &user)?,
        Commands::Advance { user, key, amount } => {
            cli::missions::advance_command(&ctx, &user, &key, amount)?
        }
        Commands::Claim { user, mission_id } => {
            cli::missions::claim_command(&ctx, &user, &mission_id)?
        }
        Commands::Profile { user } => cli::profile::profile_command(&ctx, &user)?,
        Commands::Grant { user, key, days } => {
            cli::missions::grant_command(&ctx, &user, &key, days)?
        }
        Commands::Init { .. } => {}
    }

    Ok(())
}
