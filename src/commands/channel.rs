//! Channel management commands
//!
//! Handlers for `kanava channel {list,add,edit,remove,use,balance}`. Every
//! mutation goes through the store wholesale: load, change, save.

use crate::api::ChatClient;
use crate::cli::ChannelCommand;
use crate::config::Config;
use crate::error::{KanavaError, Result};
use crate::store::{Channel, StoreData};
use colored::Colorize;
use prettytable::{format, Table};
use std::time::Duration;

/// Handle a channel subcommand
pub async fn handle_channel(config: &Config, command: ChannelCommand) -> Result<()> {
    let store = super::open_store(config)?;

    match command {
        ChannelCommand::List => {
            let data = store.load()?;
            print_channel_list(&data);
        }
        ChannelCommand::Add {
            name,
            endpoint,
            key,
            models,
        } => {
            validate_endpoint(&endpoint)?;

            let channel = Channel::new(name, endpoint, key, Channel::parse_models(&models));
            let channel_id = channel.id.clone();
            let channel_name = channel.name.clone();

            let data = store.update(|data| {
                data.api_channels.push(channel);
                // The first channel becomes the current one automatically.
                if data.api_channels.len() == 1 {
                    data.current_channel_id = Some(channel_id.clone());
                }
            })?;

            println!(
                "{}",
                format!("Added channel {} ({})", channel_name, &channel_id[..8]).green()
            );
            if data.current_channel_id.as_deref() == Some(channel_id.as_str()) {
                println!("Selected as the current channel.");
            }
        }
        ChannelCommand::Edit {
            channel,
            name,
            endpoint,
            key,
            models,
        } => {
            if let Some(endpoint) = &endpoint {
                validate_endpoint(endpoint)?;
            }

            let data = store.load()?;
            let id = resolve_channel_id(&data, &channel)?;

            store.update(|data| {
                if let Some(existing) = data.api_channels.iter_mut().find(|c| c.id == id) {
                    if let Some(name) = name {
                        existing.name = name;
                    }
                    if let Some(endpoint) = endpoint {
                        existing.endpoint = endpoint;
                    }
                    if let Some(key) = key {
                        existing.key = key;
                    }
                    if let Some(models) = models {
                        existing.models = Channel::parse_models(&models);
                    }
                }
            })?;

            println!("{}", format!("Updated channel {}", &id[..8]).green());
        }
        ChannelCommand::Remove { channel } => {
            let data = store.load()?;
            let id = resolve_channel_id(&data, &channel)?;

            let data = store.update(|data| {
                data.api_channels.retain(|c| c.id != id);
                // Removing the current channel falls back to the first
                // remaining one, or clears the selection.
                if data.current_channel_id.as_deref() == Some(id.as_str()) {
                    data.current_channel_id = data.api_channels.first().map(|c| c.id.clone());
                }
            })?;

            println!("{}", format!("Removed channel {}", &id[..8]).green());
            if let Some(current) = data.current_channel() {
                println!("Current channel is now {}.", current.name);
            }
        }
        ChannelCommand::Use { channel } => {
            let data = store.load()?;
            let id = resolve_channel_id(&data, &channel)?;
            let name = data
                .channel(&id)
                .map(|c| c.name.clone())
                .unwrap_or_default();

            store.update(|data| data.current_channel_id = Some(id.clone()))?;
            println!("{}", format!("Using channel {}", name).green());
        }
        ChannelCommand::Balance { channel } => {
            let data = store.load()?;
            let target = match &channel {
                Some(needle) => {
                    let id = resolve_channel_id(&data, needle)?;
                    data.channel(&id).cloned()
                }
                None => data.current_channel().cloned(),
            };

            let target = target.ok_or_else(|| {
                KanavaError::Channel("No channel selected; run `kanava channel use`".to_string())
            })?;

            let client = ChatClient::new(Duration::from_secs(config.api.timeout_seconds))?;
            let balance = client.check_balance(&target).await;
            println!("{}: {}", target.name, balance);
        }
    }

    Ok(())
}

/// Resolve a user-supplied channel reference to a channel id
pub(crate) fn resolve_channel_id(data: &StoreData, needle: &str) -> Result<String> {
    data.find_channel(needle)
        .map(|c| c.id.clone())
        .ok_or_else(|| KanavaError::Channel(format!("No channel matches '{}'", needle)).into())
}

/// Reject endpoints that do not parse as URLs
fn validate_endpoint(endpoint: &str) -> Result<()> {
    url::Url::parse(endpoint)
        .map_err(|e| KanavaError::Channel(format!("Invalid endpoint URL '{}': {}", endpoint, e)))?;
    Ok(())
}

/// Print the channel table
fn print_channel_list(data: &StoreData) {
    if data.api_channels.is_empty() {
        println!("{}", "No channels configured. Add one with `kanava channel add`.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Name".bold(),
        "Endpoint".bold(),
        "Models".bold(),
        "".bold()
    ]);

    for channel in &data.api_channels {
        let id_short = &channel.id[..8.min(channel.id.len())];
        let models = channel
            .models
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let current = if data.current_channel_id.as_deref() == Some(channel.id.as_str()) {
            "current"
        } else {
            ""
        };

        table.add_row(prettytable::row![
            id_short.cyan(),
            channel.name,
            channel.endpoint,
            models,
            current.green()
        ]);
    }

    println!("\nConfigured channels:");
    table.printstd();
    println!();
}
