use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod context;
mod credentials;
mod format;
mod logging;

/// Sweep - Container Registry Cleaner
///
/// Deletes stale images from container registries according to a retention
/// policy: an upload cutoff, a number of recent images to keep, and whether
/// tagged images may go.
#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    /// Path to the config file (defaults to ~/.config/sweep/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete stale images from one or more repositories
    Clean(commands::clean::CleanArgs),
    /// Store credentials for a registry
    Login {
        /// Registry host (e.g. gcr.io, localhost:5000)
        registry: String,
        /// Username (will prompt if not provided)
        #[arg(short, long)]
        username: Option<String>,
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Remove stored credentials for a registry
    Logout {
        /// Registry host
        registry: String,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Commands that need no configuration
    match &cli.command {
        Commands::Version => {
            commands::version::print_version();
            return;
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            return;
        }
        _ => {}
    }

    // Build context with precedence: defaults > config file > env vars > CLI flags
    let verbosity = context::VerbosityLevel::from_count(cli.verbose);
    let ctx = match context::AppContext::build(
        cli.config.as_deref(),
        cli.color.as_deref().map(format::ColorChoice::from),
        verbosity,
    ) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    logging::init(ctx.verbosity, format::should_color(ctx.color));
    tracing::debug!(color = %ctx.color, credentials = %ctx.credentials_path.display(), "context ready");

    match cli.command {
        Commands::Clean(args) => commands::clean::handle_clean(&ctx, &args).await,
        Commands::Login {
            registry,
            username,
            password,
        } => {
            commands::auth::handle_login(&ctx, &registry, username.as_deref(), password.as_deref());
        }
        Commands::Logout { registry } => {
            commands::auth::handle_logout(&ctx, &registry);
        }
        Commands::Version | Commands::Completion { .. } => {}
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
