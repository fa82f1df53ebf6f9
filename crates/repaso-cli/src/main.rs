use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "repaso", version, about = "Repaso CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Item management
    Item {
        #[command(subcommand)]
        action: commands::item::ItemAction,
    },
    /// User and scheduling profile management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Today's focus selection (stable for the whole day)
    Today {
        /// Email of the user (optional when only one user exists)
        #[arg(long)]
        user: Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Scheduling weights for all active items, highest first
    Weights {
        /// Email of the user (optional when only one user exists)
        #[arg(long)]
        user: Option<String>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Dispatch sweeps: one-shot trigger or periodic daemon
    Dispatch {
        #[command(subcommand)]
        action: commands::dispatch::DispatchAction,
    },
    /// Diagnostics for the scheduling pipeline
    Diagnostics {
        #[command(subcommand)]
        action: commands::diagnostics::DiagnosticsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Item { action } => commands::item::run(action),
        Commands::User { action } => commands::user::run(action),
        Commands::Today { user, json } => commands::today::run(user.as_deref(), json),
        Commands::Weights { user, json } => commands::weights::run(user.as_deref(), json),
        Commands::Dispatch { action } => commands::dispatch::run(action),
        Commands::Diagnostics { action } => commands::diagnostics::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
