use clap::{Parser, Subcommand};

/// A Discord bot that keeps help channels tidy
#[derive(Parser, Debug)]
#[command(name = "help_desk_bot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A Discord bot that tracks busy help channels", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file instead of ./.env
    #[arg(short, long, value_name = "FILE")]
    pub env_file: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// The command prefix for the bot
    #[arg(short, long, default_value = "!")]
    pub prefix: String,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot
    Start {
        /// Comma separated help channel ids (overrides HELP_CHANNEL_IDS)
        #[arg(long)]
        help_channels: Option<String>,
    },

    /// Generate a sample .env file
    GenEnv {
        /// Path to output the sample .env file
        #[arg(default_value = ".env.example")]
        path: String,
    },
}
