//! agentseal CLI - sign, verify and anchor agent replies
//!
//! ```bash
//! # Who am I on the node?
//! agentseal whoami
//!
//! # Sign a reply and print the wire payload
//! agentseal sign --original "Are you free?" --response "Yes"
//!
//! # Verify a received reply
//! agentseal verify --file reply.json --expected "Are you free?"
//!
//! # Full round trip with ledger anchoring
//! agentseal --role host exchange --peer Bob_Agent --task "Are you free?" --reply "Yes"
//!
//! # Environment overrides
//! AGENTSEAL__NODE__PORT=20007 agentseal whoami
//! ```

mod commands;
mod config;
mod display;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AppConfig, LoggingConfig};

/// agentseal - signed, verifiable agent-to-agent replies
#[derive(Parser, Debug)]
#[command(name = "agentseal")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Role used to pick the node port from `node.ports`
    #[arg(long, global = true, env = "AGENTSEAL_ROLE")]
    role: Option<String>,

    /// Log format (json, pretty); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover this node's DID
    Whoami {
        /// Account index on the node
        #[arg(long)]
        index: Option<usize>,
    },

    /// Print the canonical form of an envelope and its digest
    Canonicalize {
        #[arg(long)]
        original: String,
        #[arg(long)]
        response: String,
    },

    /// Sign an envelope and print the signed payload
    Sign {
        #[arg(long)]
        original: String,
        #[arg(long)]
        response: String,
        /// Signer DID; discovered when omitted
        #[arg(long)]
        did: Option<String>,
    },

    /// Verify the signed payloads in a reply file
    Verify {
        /// One fragment per line, or a single JSON payload
        #[arg(long)]
        file: PathBuf,
        /// The message that was originally sent
        #[arg(long)]
        expected: String,
        #[arg(long, default_value = "peer")]
        peer: String,
    },

    /// Mint and deploy the anchoring token, reusing a cached one
    Mint {
        #[arg(long)]
        metadata: Option<PathBuf>,
        #[arg(long)]
        artifact: Option<PathBuf>,
        /// Mint even when a token is cached
        #[arg(long)]
        force: bool,
    },

    /// Execute against the anchoring token and sign the execution
    Execute {
        #[arg(long)]
        comment: String,
        #[arg(long)]
        data: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        receiver: Option<String>,
    },

    /// Run a signed exchange with an in-process peer
    Exchange {
        #[arg(long)]
        peer: String,
        #[arg(long)]
        task: String,
        /// What the peer answers
        #[arg(long)]
        reply: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load(cli.config.as_deref())?;
    if let Some(format) = cli.log_format {
        app_config.logging.format = format;
    }
    init_logging(&app_config.logging);

    let role = cli.role.as_deref();
    match cli.command {
        Commands::Whoami { index } => commands::whoami(&app_config, role, index).await,
        Commands::Canonicalize { original, response } => commands::canonicalize(&original, &response),
        Commands::Sign {
            original,
            response,
            did,
        } => commands::sign(&app_config, role, &original, &response, did).await,
        Commands::Verify {
            file,
            expected,
            peer,
        } => commands::verify(&app_config, role, &file, &expected, &peer).await,
        Commands::Mint {
            metadata,
            artifact,
            force,
        } => commands::mint(&app_config, role, metadata, artifact, force).await,
        Commands::Execute {
            comment,
            data,
            token,
            receiver,
        } => commands::execute(&app_config, role, comment, data, token, receiver).await,
        Commands::Exchange { peer, task, reply } => {
            commands::exchange(&app_config, role, &peer, &task, &reply).await
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    }
}
