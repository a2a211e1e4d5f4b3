mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{action::ActionSubcommand, group::GroupSubcommand, rule::RuleSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "quorum",
    about = "Gate command execution behind group-based multi-party approval",
    version,
    propagate_version = true
)]
struct Cli {
    /// Site root (default: auto-detect from .quorum/ or .git/)
    #[arg(long, global = true, env = "QUORUM_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the quorum store in the current site
    Init,

    /// Check what decision an actor would get for a command
    Check { unum: String, command: String },

    /// Create, approve, and inspect gated actions
    Action {
        #[command(subcommand)]
        subcommand: ActionSubcommand,
    },

    /// Manage group memberships
    Group {
        #[command(subcommand)]
        subcommand: GroupSubcommand,
    },

    /// Manage permission rules
    Rule {
        #[command(subcommand)]
        subcommand: RuleSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Check { unum, command } => cmd::check::run(&root, &unum, &command, cli.json),
        Commands::Action { subcommand } => cmd::action::run(&root, subcommand, cli.json),
        Commands::Group { subcommand } => cmd::group::run(&root, subcommand, cli.json),
        Commands::Rule { subcommand } => cmd::rule::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
