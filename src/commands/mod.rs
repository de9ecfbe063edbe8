/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes one module per top-level command:

- `chat`    — Interactive chat session
- `channel` — Channel management (list/add/edit/remove/use/balance)
- `history` — Conversation history (list/show/rename/delete)
- `theme`   — Theme preference

These handlers are intentionally small and use the library components:
the store, the chat client, and the streaming decoder.
*/

use crate::config::Config;
use crate::error::Result;
use crate::store::JsonStore;

pub mod channel;
pub mod chat;
pub mod history;
pub mod special_commands;
pub mod theme;

/// Open the store at the configured location
///
/// Uses the configured path override when present, otherwise the default
/// data-directory location (which itself honors the `KANAVA_STORE`
/// environment variable).
pub fn open_store(config: &Config) -> Result<JsonStore> {
    match &config.store.path {
        Some(path) => JsonStore::new_with_path(path),
        None => JsonStore::new(),
    }
}
