use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "daoqi", version, about = "Chinese natural-language todo reminders")]
struct Cli {
    /// Scope (chat or user identifier) the command applies to
    #[arg(long, global = true, default_value = "local")]
    scope: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Run the reminder loop with console delivery
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Task { action } => commands::task::run(action, &cli.scope).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Watch => commands::watch::run().await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
