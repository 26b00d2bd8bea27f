use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "offerkit", version, about = "offerkit CLI")]
struct Cli {
    /// Use a throwaway in-memory store instead of the configured backend
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rolling offer countdown
    Countdown(commands::countdown::CountdownArgs),
    /// Decaying stock counter
    Stock(commands::stock::StockArgs),
    /// Captured leads
    Lead {
        #[command(subcommand)]
        action: commands::lead::LeadAction,
    },
    /// Visitor comments
    Comment {
        #[command(subcommand)]
        action: commands::comment::CommentAction,
    },
    /// Inspect or wipe persisted data
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn with_context<F>(memory: bool, f: F) -> common::CliResult
where
    F: FnOnce(&common::Context) -> common::CliResult,
{
    let ctx = common::Context::open(memory)?;
    f(&ctx)
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let memory = cli.memory;
    let result = match cli.command {
        Commands::Countdown(args) => with_context(memory, |ctx| commands::countdown::run(args, ctx)),
        Commands::Stock(args) => with_context(memory, |ctx| commands::stock::run(args, ctx)),
        Commands::Lead { action } => with_context(memory, |ctx| commands::lead::run(action, ctx)),
        Commands::Comment { action } => {
            with_context(memory, |ctx| commands::comment::run(action, ctx))
        }
        Commands::Admin { action } => with_context(memory, |ctx| commands::admin::run(action, ctx)),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
