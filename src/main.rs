mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podium::config::Config;

#[derive(Parser)]
#[command(
    name = "podium",
    version,
    about = "Leaderboard snapshots, podium badges and rank movement",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables otherwise)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config value
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute every category and persist a snapshot set
    Run {
        /// Comma-separated category ids (default: all configured)
        #[arg(short, long)]
        categories: Option<String>,

        /// Print the run report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show a subject's podium badges
    Badges {
        /// Subject id
        #[arg(short, long)]
        subject: i64,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show rank movement for one or more subjects
    Deltas {
        /// Subject id (repeatable)
        #[arg(short, long, required = true)]
        subject: Vec<i64>,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Build rank digests from the latest snapshots
    Digest {
        /// Subject id (repeatable; default: every known subject)
        #[arg(short, long)]
        subject: Vec<i64>,

        /// Hand the digests to the delivery sink
        #[arg(long, default_value = "false")]
        deliver: bool,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show the last recorded snapshot run
    Runlog {
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Start the HTTP server
    Serve {
        /// Bind address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Register or update a subject in the activity database
    Subject {
        #[arg(short, long)]
        subject: i64,

        /// Mark as a teacher account (eligible for the top-teachers board)
        #[arg(long, default_value = "false")]
        teacher: bool,

        /// Mark as inactive (excluded from every ranking)
        #[arg(long, default_value = "false")]
        inactive: bool,

        /// Join time, RFC 3339 (default: now)
        #[arg(long)]
        joined_at: Option<String>,
    },

    /// Record an activity event
    Activity {
        #[arg(short, long)]
        subject: i64,

        /// Activity kind, e.g. like-received, competition-win
        #[arg(short, long)]
        kind: String,

        #[arg(short, long, default_value = "1")]
        amount: i64,

        /// Event time, RFC 3339 (default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate()?;

    let format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&format, &config.logging.level, cli.verbose)?;

    tracing::debug!(
        snapshot_db = %config.database.snapshot_path.display(),
        activity_db = %config.database.activity_path.display(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { categories, json } => {
            let categories = commands::parse_categories(categories.as_deref())?;
            tracing::info!(categories = ?categories, "Starting run command");
            commands::run(&config, &categories, "cli", json)?;
        }

        Commands::Badges { subject, json } => {
            commands::badges(&config, subject, json)?;
        }

        Commands::Deltas { subject, json } => {
            commands::deltas(&config, &subject, json)?;
        }

        Commands::Digest {
            subject,
            deliver,
            json,
        } => {
            tracing::info!(subjects = subject.len(), deliver, "Starting digest command");
            commands::digest(&config, subject, deliver, json).await?;
        }

        Commands::Runlog { json } => {
            commands::runlog(&config, json)?;
        }

        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting serve command");
            commands::serve(&config).await?;
        }

        Commands::Subject {
            subject,
            teacher,
            inactive,
            joined_at,
        } => {
            commands::upsert_subject(
                &config,
                commands::SubjectParams {
                    subject,
                    teacher,
                    inactive,
                    joined_at,
                },
            )?;
        }

        Commands::Activity {
            subject,
            kind,
            amount,
            at,
        } => {
            commands::record_activity(
                &config,
                commands::ActivityParams {
                    subject,
                    kind,
                    amount,
                    at,
                },
            )?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("podium=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new(format!("podium={level},warn"))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
