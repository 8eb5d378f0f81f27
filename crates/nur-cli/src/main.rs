use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "nur", version, about = "Prayer times and reminders")]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Today's prayer times
    Today(commands::today::TodayArgs),
    /// Prayer times for the next 7 days
    Week(commands::range::RangeArgs),
    /// Prayer times for the next 30 days
    Month(commands::range::RangeArgs),
    /// Show the reminders today's schedule would produce
    Reminders(commands::reminders::RemindersArgs),
    /// Keep running and print reminders as they fire
    Watch,
    /// Calculation methods
    Methods(commands::methods::MethodsArgs),
    /// Location management
    Location {
        #[command(subcommand)]
        action: commands::location::LocationAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Schedule cache maintenance
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheAction,
    },
}

/// `NUR_LOG` takes precedence over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "nur=info,nur_core=info" } else { "warn" };
    let filter = EnvFilter::try_from_env("NUR_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Today(args) => commands::today::run(args).await,
        Commands::Week(args) => commands::range::run(commands::range::Span::Week, args).await,
        Commands::Month(args) => commands::range::run(commands::range::Span::Month, args).await,
        Commands::Reminders(args) => commands::reminders::run(args).await,
        Commands::Watch => commands::watch::run().await,
        Commands::Methods(args) => commands::methods::run(args),
        Commands::Location { action } => commands::location::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Cache { action } => commands::cache::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
