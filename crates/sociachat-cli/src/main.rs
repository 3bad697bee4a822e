use anyhow::Result;
use clap::Parser;
use sociachat_etl::Config;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sociachat", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/sociachat/sociachat.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Collection to load into and query (default: politik2)
    #[arg(long, global = true)]
    collection: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Load CSV tweet exports into the collection
    ///
    /// Reads every `.csv` file directly inside the directory (no recursion),
    /// in file-name order. Each file must have a header row containing the
    /// text column (`tweet` unless configured otherwise).
    ///
    /// - Missing tweet values become empty strings
    /// - Rows repeated across or within files are dropped, keeping the first
    /// - Every document is tagged with {"keyword": <topic>}
    /// - Documents are added in batches of at most `batch_size`
    ///
    /// The collection is created on the first load and reused afterwards.
    /// Ids that are already stored are skipped, so re-running a load over the
    /// same files adds nothing.
    ///
    /// Output: the number of duplicate rows dropped, then a completion message.
    Load {
        /// Directory holding the CSV files (default: data_dir from config)
        path: Option<PathBuf>,
    },
    /// Retrieve the closest tweets as one ranked text block
    Query {
        /// Query text
        text: String,

        /// Number of entries in the summary
        #[arg(long)]
        top_k: Option<usize>,

        /// Number of nearest candidates fetched before ranking
        #[arg(long)]
        candidates: Option<usize>,
    },
    /// Show collections and their document counts
    Status,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file when no key is given
    Get {
        key: Option<String>,
    },
    /// Set a value in the config file
    Set {
        key: String,
        value: String,
    },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config()?,
            ConfigAction::Get { key } => commands::config::get_config(key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
        command => {
            let config = load_config(cli.db, cli.collection)?;
            run(command, config).await?;
        }
    }

    Ok(())
}

/// Merge CLI overrides into the file and environment configuration.
fn load_config(db: Option<PathBuf>, collection: Option<String>) -> Result<Config> {
    let mut config = match db {
        Some(db_path) => Config::load_with_db_path(db_path)?,
        None => Config::load()?,
    };
    if let Some(collection) = collection {
        config.collection_name = collection;
    }

    // Ensure database directory exists
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(config)
}

async fn run(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Load { path } => {
            if let Some(path) = path {
                config.data_dir = path;
            }
            commands::run_load(config).await?;
        }
        Commands::Query {
            text,
            top_k,
            candidates,
        } => {
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            if let Some(candidates) = candidates {
                config.candidate_limit = candidates;
            }
            commands::run_query(&config, &text)?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        // Handled in main before configuration is loaded.
        Commands::Config { .. } => {}
    }

    Ok(())
}
