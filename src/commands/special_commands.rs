//! Special commands parser for interactive chat mode
//!
//! This module parses the slash-commands that can be entered during an
//! interactive chat session. Special commands act on the session itself
//! (switch model, start a new conversation, show status) rather than being
//! sent to the remote endpoint.
//!
//! Commands are prefixed with `/` and are case-insensitive.

use colored::Colorize;

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a new conversation on the current channel
    NewConversation,

    /// Switch the conversation to a different model by name
    SwitchModel(String),

    /// List the current channel's models
    ListModels,

    /// List configured channels
    ListChannels,

    /// List recent conversations
    ListHistory,

    /// Display current channel, model, and conversation status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the session
    Exit,

    /// A `/`-prefixed input that matches no known command
    Unknown(String),

    /// Not a special command; send the input to the assistant
    None,
}

/// Parse user input into a special command
///
/// Input that does not start with `/` is never a special command.
///
/// # Arguments
///
/// * `input` - Trimmed user input line
///
/// # Examples
///
/// ```
/// use kanava::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/new"), SpecialCommand::NewConversation);
/// assert_eq!(
///     parse_special_command("/model gpt-4o"),
///     SpecialCommand::SwitchModel("gpt-4o".to_string())
/// );
/// assert_eq!(parse_special_command("hello"), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> SpecialCommand {
    if !input.starts_with('/') {
        return SpecialCommand::None;
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("").to_lowercase();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match command.as_str() {
        "/new" => SpecialCommand::NewConversation,
        "/model" => match arg {
            Some(name) => SpecialCommand::SwitchModel(name.to_string()),
            None => SpecialCommand::ListModels,
        },
        "/models" => SpecialCommand::ListModels,
        "/channels" => SpecialCommand::ListChannels,
        "/history" => SpecialCommand::ListHistory,
        "/status" => SpecialCommand::ShowStatus,
        "/help" => SpecialCommand::Help,
        "/exit" | "/quit" => SpecialCommand::Exit,
        _ => SpecialCommand::Unknown(command),
    }
}

/// Print help for the interactive chat session
pub fn print_help() {
    println!();
    println!("{}", "Available commands:".bold());
    println!("  {}       Start a new conversation", "/new".cyan());
    println!("  {}  Switch model for this conversation", "/model <name>".cyan());
    println!("  {}    List the channel's models", "/models".cyan());
    println!("  {}  List configured channels", "/channels".cyan());
    println!("  {}   List recent conversations", "/history".cyan());
    println!("  {}    Show channel, model, and conversation", "/status".cyan());
    println!("  {}      Show this help", "/help".cyan());
    println!("  {}      Leave the session", "/exit".cyan());
    println!();
    println!("Anything else is sent to the assistant.");
    println!();
}
