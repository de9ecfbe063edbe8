//! Kanava - terminal chat client
//!
#![doc = "Kanava - terminal chat client"]
#![doc = "Main entry point for the Kanava application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kanava::cli::{Cli, Commands};
use kanava::commands;
use kanava::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // If the user supplied a store path on the CLI (or via env), mirror it
    // into KANAVA_STORE so the store initializer can pick it up.
    if let Some(store_path) = &cli.store_path {
        std::env::set_var(kanava::store::STORE_PATH_ENV, store_path);
        tracing::info!("Using store override from CLI: {}", store_path);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat {
            channel,
            model,
            resume,
            new,
        } => {
            tracing::info!("Starting interactive chat session");
            if let Some(c) = &channel {
                tracing::debug!("Using channel override: {}", c);
            }
            if let Some(m) = &model {
                tracing::debug!("Using model override: {}", m);
            }
            if let Some(r) = &resume {
                tracing::debug!("Resuming conversation: {}", r);
            }

            commands::chat::run_chat(config, channel, model, resume, new).await?;
            Ok(())
        }
        Commands::Channel { command } => {
            tracing::info!("Starting channel management command");
            commands::channel::handle_channel(&config, command).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, command)?;
            Ok(())
        }
        Commands::Theme { value } => {
            commands::theme::handle_theme(&config, value)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kanava=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
