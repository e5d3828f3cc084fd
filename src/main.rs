mod cli;
mod commands;
mod config;
mod help_channels;
mod platform;
#[cfg(test)]
mod test_helpers;

use anyhow::Result;
use clap::Parser;
use serenity::Client;
use serenity::all::GatewayIntents;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use commands::{
    CommandHandler, CommandRegistry, DONE_COMMAND, DoneCommand, HelpCommand, LifetimeCommand,
    ResourcesCommand,
};
use config::{Config, parse_id_list};
use help_channels::HelpChannelTracker;
use platform::{DiscordPlatform, EventRouter};

/// The main entry point for the application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = &cli.env_file {
        info!("Loading environment from {}", path);
        dotenv::from_path(path)?;
    }

    match &cli.command {
        Some(Commands::Start { help_channels }) => {
            start_bot(cli.prefix.clone(), help_channels.clone()).await?;
        }
        Some(Commands::GenEnv { path }) => {
            generate_env_file(path)?;
        }
        None => {
            // Default to start command if no subcommand is specified
            start_bot(cli.prefix.clone(), None).await?;
        }
    }

    Ok(())
}

/// Start the bot with the given configuration
async fn start_bot(prefix: String, help_channels_override: Option<String>) -> Result<()> {
    // Load configuration
    info!("Loading configuration");
    let mut config = Config::from_env()?;

    // Override help channels if specified
    if let Some(help_channels) = help_channels_override {
        config.help_channel_ids = parse_id_list(&help_channels);
    }

    let platform = Arc::new(DiscordPlatform::new(&config.discord_token));

    // Look up the help channels before connecting so no message is missed
    let tracker = HelpChannelTracker::new(platform.clone(), config.tracker_settings(&prefix))?;
    info!("Looking up {} help channels", config.help_channel_ids.len());
    tracker.start(&config.help_channel_ids).await;

    let tracked = tracker.tracked_count().await;
    if tracked < config.help_channel_ids.len() {
        warn!(
            "Only {} of {} help channels could be found",
            tracked,
            config.help_channel_ids.len()
        );
    }

    // Set up command registry
    let mut registry = CommandRegistry::new();
    registry.register(
        "lifetime",
        Arc::new(LifetimeCommand::new(platform.clone(), config.server_name.clone())),
    );
    registry.register("resources", Arc::new(ResourcesCommand::new()));
    registry.register(
        DONE_COMMAND,
        Arc::new(DoneCommand::new(tracker.clone(), config.helper_user_ids.clone())),
    );

    let mut descriptions = registry.descriptions();
    descriptions.push((
        "help".to_string(),
        "Shows help information for available commands".to_string(),
    ));
    registry.register(
        "help",
        Arc::new(HelpCommand::new(prefix.clone(), descriptions)),
    );

    info!(
        "Registered commands: lifetime, resources, done, help with prefix: '{}'",
        prefix
    );

    let command_handler = Arc::new(CommandHandler::new(
        platform.clone(),
        Arc::new(RwLock::new(registry)),
        prefix,
    ));
    let router = EventRouter::new(command_handler, tracker.clone());

    // Things we want Discord to tell us about
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(router)
        .await?;
    let shard_manager = client.shard_manager.clone();

    info!("Bot is now running. Press Ctrl+C to exit.");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutting down...");
            shard_manager.shutdown_all().await;
        }
    }

    // Busy channels keep their names and are recovered on the next start
    tracker.stop().await;

    Ok(())
}

/// Generate a sample .env file
fn generate_env_file(path: &str) -> Result<()> {
    info!("Generating sample .env file at {}", path);

    let contents = r#"# Your Discord bot token (get one from the Discord Developer Portal)
DISCORD_TOKEN=your_bot_token_here
# Comma separated ids of the help channels to track
HELP_CHANNEL_IDS=123456789012345678,234567890123456789
# Optional: How long a help channel stays busy without activity, in milliseconds
# HELP_CHANNEL_BUSY_TIMEOUT_MS=600000
# Optional: Suffix added to busy help channels
# HELP_CHANNEL_BUSY_SUFFIX=__busy
# Optional: Comma separated ids of users who may free any help channel
# HELPER_USER_IDS=
# Optional: Server name used when a command is used elsewhere
# SERVER_NAME=/r/unity
"#;

    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;

    info!("Sample .env file generated successfully!");

    Ok(())
}
