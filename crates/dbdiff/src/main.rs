//! dbdiff CLI
//!
//! Command-line tool that diffs two database schemas and prints the
//! upgrade SQL.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dbdiff::mysql::{connect_pool, fetch_snapshot};
use dbdiff::prelude::*;
use dbdiff::snapshot;

/// Diff databases and generate upgrade SQL.
#[derive(Parser)]
#[command(name = "dbdiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the statements that upgrade the old schema to the new one.
    Diff {
        /// Backend type: mysql or snapshot.
        #[arg(short = 't', long = "type", env = "DBDIFF_TYPE")]
        kind: String,

        /// Schema in the higher version (DSN or snapshot file).
        #[arg(short, long, env = "DBDIFF_NEW")]
        new: String,

        /// Schema in the lower version (DSN or snapshot file).
        #[arg(short, long, env = "DBDIFF_OLD")]
        old: String,

        /// Only compare tables whose names start with this prefix.
        #[arg(long)]
        prefix: Option<String>,

        /// Print the computed delta as JSON before the statements.
        #[arg(long)]
        json: bool,

        /// How changed table attributes are emitted.
        #[arg(long, value_enum, default_value_t = PolicyArg::Changed)]
        attribute_policy: PolicyArg,

        /// Connections per database pool.
        #[arg(long, default_value_t = 2)]
        max_connections: u32,
    },

    /// Write the structure of a MySQL database to a snapshot file.
    Dump {
        /// Database DSN.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Only include tables whose names start with this prefix.
        #[arg(long)]
        prefix: Option<String>,

        /// Output file (stdout if not specified).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Only the attributes that differ.
    Changed,
    /// All attributes once any one differs.
    Full,
}

impl From<PolicyArg> for AttributePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Changed => Self::ChangedOnly,
            PolicyArg::Full => Self::Full,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries only SQL/JSON
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Diff {
            kind,
            new,
            old,
            prefix,
            json,
            attribute_policy,
            max_connections,
        } => {
            let registry = DifferRegistry::with_defaults();
            let mut config = DifferConfig::new(new, old)
                .max_connections(max_connections)
                .attribute_policy(attribute_policy.into());
            if let Some(prefix) = prefix {
                config = config.table_prefix(prefix);
            }
            info!(driver = %kind, new = %config.newer, old = %config.older, "Comparing schemas");

            let differ = registry.open(&kind, config).await?;
            let outcome = run_diff(differ.as_ref(), json).await;
            differ.close().await?;
            outcome?;
        }

        Commands::Dump {
            database,
            prefix,
            output,
        } => {
            let pool = connect_pool(&database, 1).await?;
            let schema = fetch_snapshot(&pool, prefix.as_deref()).await;
            pool.close().await;
            let schema = schema?;

            match output {
                Some(path) => snapshot::save(&path, &schema).await?,
                None => println!("{}", serde_json::to_string_pretty(&schema)?),
            }
        }
    }

    Ok(())
}

async fn run_diff(differ: &dyn Differ, json: bool) -> Result<()> {
    let delta = differ.diff().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&delta)?);
    }

    let statements = differ.generate(&delta)?;
    info!(summary = %delta.summary(), "Diff complete");
    if statements.is_empty() {
        info!("Schemas are identical.");
    }
    for sql in &statements {
        println!("{sql}");
    }
    Ok(())
}
