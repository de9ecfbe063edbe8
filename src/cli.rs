//! Command-line interface definition for Kanava
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, channel management,
//! conversation history, and the theme preference.

use clap::{Parser, Subcommand};

/// Kanava - terminal chat client for configured API channels
///
/// Talk to OpenAI-compatible or Anthropic-compatible chat-completion
/// endpoints, stream responses into the terminal, and keep conversations
/// in a local store.
#[derive(Parser, Debug, Clone)]
#[command(name = "kanava")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the store file location
    #[arg(long, env = "KANAVA_STORE")]
    pub store_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Kanava
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Channel to use (id prefix or name); defaults to the current channel
        #[arg(short = 'C', long)]
        channel: Option<String>,

        /// Model name override for this session
        #[arg(short, long)]
        model: Option<String>,

        /// Resume a conversation by id prefix
        #[arg(short, long)]
        resume: Option<String>,

        /// Start a fresh conversation instead of resuming the current one
        #[arg(long)]
        new: bool,
    },

    /// Manage API channels
    Channel {
        /// Channel management subcommand
        #[command(subcommand)]
        command: ChannelCommand,
    },

    /// Manage conversation history
    History {
        /// History management subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Show or change the theme preference
    Theme {
        /// New value: "light", "dark", or "toggle"; omit to show the current theme
        value: Option<String>,
    },
}

/// Channel management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChannelCommand {
    /// List configured channels
    List,

    /// Add a channel
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Endpoint URL the chat request is posted to
        #[arg(short, long)]
        endpoint: String,

        /// Secret key for the endpoint
        #[arg(short, long)]
        key: String,

        /// Model names, comma-separated (defaults to a single "default-model")
        #[arg(short, long, default_value = "")]
        models: String,
    },

    /// Update an existing channel (unspecified fields keep their values)
    Edit {
        /// Channel to edit (id prefix or name)
        channel: String,

        /// New display name
        #[arg(short, long)]
        name: Option<String>,

        /// New endpoint URL
        #[arg(short, long)]
        endpoint: Option<String>,

        /// New secret key
        #[arg(short, long)]
        key: Option<String>,

        /// New model list, comma-separated
        #[arg(short, long)]
        models: Option<String>,
    },

    /// Remove a channel
    Remove {
        /// Channel to remove (id prefix or name)
        channel: String,
    },

    /// Select the current channel
    Use {
        /// Channel to select (id prefix or name)
        channel: String,
    },

    /// Query the remaining account credit for a channel
    Balance {
        /// Channel to query (id prefix or name); defaults to the current channel
        channel: Option<String>,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List conversations, most recently active first
    List,

    /// Print a conversation transcript
    Show {
        /// Conversation id prefix
        id: String,
    },

    /// Rename a conversation
    Rename {
        /// Conversation id prefix
        id: String,

        /// New title
        title: String,
    },

    /// Delete a conversation
    Delete {
        /// Conversation id prefix
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
