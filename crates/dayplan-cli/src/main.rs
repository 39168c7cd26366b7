use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dayplan", version, about = "Recurring tasks and day planning")]
struct Cli {
    /// Owner whose data is read and written (defaults to `owner` in config)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recurring task definitions
    Recur {
        #[command(subcommand)]
        action: commands::recur::RecurAction,
    },
    /// Dated occurrences
    Occurrence {
        #[command(subcommand)]
        action: commands::occurrence::OccurrenceAction,
    },
    /// Fit task lines into the free time of a day
    Plan(commands::plan::PlanArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DAYPLAN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let owner = cli.owner;
    let result = match cli.command {
        Commands::Recur { action } => commands::recur::run(action, owner),
        Commands::Occurrence { action } => commands::occurrence::run(action, owner),
        Commands::Plan(args) => commands::plan::run(args, owner),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
