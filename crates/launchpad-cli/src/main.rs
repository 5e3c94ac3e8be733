mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    checklist::ChecklistSubcommand, config::ConfigSubcommand, listing::ListingSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "launchpad",
    about = "Keep app store listings and launch checklists in step",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .launchpad/)
    #[arg(long, global = true, env = "LAUNCHPAD_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config and seed the project's listing and checklists
    Init {
        /// Project slug (lowercase, hyphens)
        slug: String,
        /// Display name (default: derived from the slug)
        #[arg(long)]
        name: Option<String>,
    },

    /// Edit the store listing
    Listing {
        #[command(subcommand)]
        subcommand: ListingSubcommand,
    },

    /// Inspect and tick launch checklists
    Checklist {
        #[command(subcommand)]
        subcommand: ChecklistSubcommand,
    },

    /// Inspect the project config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() {
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
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { slug, name } => cmd::init::run(&root, &slug, name.as_deref(), cli.json),
        Commands::Listing { subcommand } => cmd::listing::run(&root, subcommand, cli.json),
        Commands::Checklist { subcommand } => cmd::checklist::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Serve { port } => cmd::serve::run(&root, port),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
