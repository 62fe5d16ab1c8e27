use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use habitweek_core::{Config, Rejection};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitweek", version, about = "Weekly habit planner")]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Weekly schedule management
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr, filtered by `HABITWEEK_LOG` or else the configured level.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("HABITWEEK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(Config::load_or_default().log.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn exit_code(err: &(dyn std::error::Error + 'static)) -> i32 {
    match err.downcast_ref::<Rejection>() {
        Some(rejection) if rejection.is_not_found() => 2,
        Some(Rejection::NoAvailability { .. }) => 3,
        Some(Rejection::QuotaExhausted { .. }) => 4,
        _ => 1,
    }
}

/// Exit with 1 on unparseable arguments; help and version exit with 0.
fn usage_exit(err: clap::Error) -> ! {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            let _ = err.print();
            std::process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::try_parse().unwrap_or_else(|e| usage_exit(e));
    init_tracing();

    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(action, cli.json),
        Commands::Schedule { action } => commands::schedule::run(action, cli.json),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(exit_code(&*e));
    }
}
