use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;
mod workspace;

/// Environment variable holding the log filter (e.g. `focus_core=debug`).
const LOG_ENV: &str = "FOCUS_LOG";

#[derive(Parser)]
#[command(name = "focus", version, about = "Focus productivity workspace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Kanban boards
    Board {
        #[command(subcommand)]
        action: commands::board::BoardAction,
    },
    /// Board columns
    Column {
        #[command(subcommand)]
        action: commands::column::ColumnAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Habits and daily check-ins
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Pomodoro timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Recorded focus sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Daily journal
    Journal {
        #[command(subcommand)]
        action: commands::journal::JournalAction,
    },
    /// Calendar events
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Productivity statistics
    Stats {
        #[command(subcommand)]
        action: Option<commands::stats::StatsAction>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print a shell completion script
    Completions { shell: Shell },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Board { action } => commands::board::run(action),
        Commands::Column { action } => commands::column::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Journal { action } => commands::journal::run(action),
        Commands::Event { action } => commands::event::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "focus", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
