//! Sift CLI, the main entry point.
//!
//! Commands:
//! - `ask`            Answer a query from retrieved passages
//! - `mock-server`    Run the OpenAI-compatible mock API
//! - `provision-cms`  Give the CMS admin its static API token
//! - `feedback`       Rate a search result or an answer
//! - `config`         Print the default or effective configuration

use clap::{Parser, Subcommand};
use sift_config::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "sift",
    about = "Sift: AI-powered search with retrieval-augmented answers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and answer a query
    Ask {
        query: String,

        /// Page of citations to show
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Wait for the whole answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Start the OpenAI-compatible mock API server
    MockServer {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Comma separated bearer tokens; empty accepts every request
        #[arg(long)]
        api_keys: Option<String>,

        /// Pause between streamed words, in milliseconds
        #[arg(long)]
        stream_delay_ms: Option<u64>,
    },

    /// Wait for the CMS and set the admin's static API token
    ProvisionCms,

    /// Submit feedback to the CMS
    Feedback {
        #[command(subcommand)]
        target: commands::feedback::FeedbackTarget,
    },

    /// Print configuration
    Config {
        /// Show the effective configuration (secrets redacted) instead of defaults
        #[arg(long)]
        show: bool,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{level},hyper=info,hyper_util=info,h2=info,rustls=info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    init_tracing(level, cli.json_logs);

    match cli.command {
        Commands::Ask {
            query,
            page,
            no_stream,
        } => commands::ask::run(&config, &query, page, !no_stream).await?,
        Commands::MockServer {
            host,
            port,
            api_keys,
            stream_delay_ms,
        } => {
            commands::mock_server::run(config, host, port, api_keys, stream_delay_ms).await?
        }
        Commands::ProvisionCms => commands::provision_cms::run(&config).await?,
        Commands::Feedback { target } => commands::feedback::run(&config, target).await?,
        Commands::Config { show } => commands::config_cmd::run(&config, show),
    }

    Ok(())
}
