//! Growth - terminal chat client
//!
#![doc = "Growth - terminal chat client"]
#![doc = "Main entry point for the Growth chat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use growth_chat::cli::{Cli, Commands};
use growth_chat::commands;
use growth_chat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { stream, chat } => {
            tracing::info!("Starting interactive chat mode");
            if let Some(c) = &chat {
                tracing::debug!("Opening chat: {}", c);
            }
            commands::chat::run_chat(config, stream, chat).await?;
            Ok(())
        }
        Commands::Send {
            message,
            stream,
            chat,
        } => {
            tracing::info!("Sending a single message");
            commands::send::run_send(config, message, stream, chat).await?;
            Ok(())
        }
        Commands::Upload { path } => {
            tracing::info!("Uploading {}", path.display());
            commands::upload::run_upload(config, &path).await?;
            Ok(())
        }
        Commands::Auth { command } => {
            tracing::info!("Starting auth command");
            commands::auth::handle_auth(config, command).await?;
            Ok(())
        }
        Commands::Chats { command } => {
            tracing::info!("Starting chats command");
            commands::history::handle_chats(config, command).await?;
            Ok(())
        }
        Commands::Theme { command } => {
            commands::theme::handle_theme(config, command)?;
            Ok(())
        }
    }
}

/// Install the tracing subscriber
///
/// Logs go to stderr so they never interleave with the chat transcript.
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "growth_chat=debug"
    } else {
        "growth_chat=warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
