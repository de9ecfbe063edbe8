//! Conversation history commands
//!
//! Handlers for `kanava history {list,show,rename,delete}`.

use crate::cli::HistoryCommand;
use crate::config::Config;
use crate::error::{KanavaError, Result};
use crate::store::StoreData;
use chrono::{Local, TimeZone};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle a history subcommand
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let store = super::open_store(config)?;

    match command {
        HistoryCommand::List => {
            let data = store.load()?;
            print_history_list(&data);
        }
        HistoryCommand::Show { id } => {
            let data = store.load()?;
            let conversation = data
                .find_conversation(&id)
                .ok_or_else(|| conversation_not_found(&id))?;

            println!();
            println!("{}", conversation.title.bold());
            println!(
                "{}",
                format!(
                    "{} · {} messages",
                    format_timestamp(conversation.created_at),
                    conversation.messages.len()
                )
                .dimmed()
            );
            println!();

            for message in &conversation.messages {
                let role = match message.role.as_str() {
                    "user" => "you".cyan().bold(),
                    "assistant" => "assistant".green().bold(),
                    other => other.normal().bold(),
                };
                let stats = message
                    .tokens
                    .map(|t| format!(" ({} tokens)", t))
                    .unwrap_or_default();
                println!(
                    "{} {}{}",
                    role,
                    format_timestamp(message.timestamp).dimmed(),
                    stats.dimmed()
                );
                println!("{}", message.content);
                println!();
            }
        }
        HistoryCommand::Rename { id, title } => {
            let data = store.load()?;
            let full_id = data
                .find_conversation(&id)
                .map(|c| c.id.clone())
                .ok_or_else(|| conversation_not_found(&id))?;

            store.update(|data| {
                if let Some(conversation) = data.conversation_mut(&full_id) {
                    conversation.title = title.clone();
                }
            })?;

            println!("{}", format!("Renamed conversation {}", &full_id[..8]).green());
        }
        HistoryCommand::Delete { id } => {
            let data = store.load()?;
            let full_id = data
                .find_conversation(&id)
                .map(|c| c.id.clone())
                .ok_or_else(|| conversation_not_found(&id))?;

            store.update(|data| {
                data.conversations.retain(|c| c.id != full_id);
                if data.current_conversation_id.as_deref() == Some(full_id.as_str()) {
                    data.current_conversation_id = None;
                }
            })?;

            println!("{}", format!("Deleted conversation {}", &full_id[..8]).green());
        }
    }

    Ok(())
}

fn conversation_not_found(id: &str) -> anyhow::Error {
    KanavaError::Storage(format!("No conversation matches '{}'", id)).into()
}

/// Print the conversation table, most recently active first
fn print_history_list(data: &StoreData) {
    let ordered = data.conversations_by_activity();

    if ordered.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last activity".bold(),
        "".bold()
    ]);

    for conversation in ordered {
        let id_short = &conversation.id[..8.min(conversation.id.len())];
        let title = if conversation.title.chars().count() > 40 {
            let cut: String = conversation.title.chars().take(37).collect();
            format!("{}...", cut)
        } else {
            conversation.title.clone()
        };
        let current = if data.current_conversation_id.as_deref() == Some(conversation.id.as_str())
        {
            "current"
        } else {
            ""
        };

        table.add_row(prettytable::row![
            id_short.cyan(),
            title,
            conversation.messages.len(),
            format_timestamp(conversation.last_activity()),
            current.green()
        ]);
    }

    println!("\nConversation history:");
    table.printstd();
    println!();
    println!(
        "Use {} to resume a conversation.",
        "kanava chat --resume <ID>".cyan()
    );
    println!();
}

/// Format an epoch-milliseconds timestamp for display
///
/// Times from today show as `Today HH:MM`; older times as `MM-DD HH:MM`.
pub(crate) fn format_timestamp(millis: i64) -> String {
    let Some(time) = Local.timestamp_millis_opt(millis).single() else {
        return String::new();
    };

    let now = Local::now();
    if time.date_naive() == now.date_naive() {
        time.format("Today %H:%M").to_string()
    } else {
        time.format("%m-%d %H:%M").to_string()
    }
}
