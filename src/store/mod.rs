//! Local JSON store for channels, conversations, and preferences
//!
//! The entire application state lives in one JSON document with five keys:
//! `apiChannels`, `conversations`, `currentChannelId`,
//! `currentConversationId`, and `theme`. Every mutation loads the document,
//! applies the change, and writes the whole document back — last writer wins,
//! no versioning, no migration. Readers tolerate missing fields on any record
//! and patch dangling channel/conversation references opportunistically on
//! load.

use crate::error::{KanavaError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod types;
pub use types::{Channel, Conversation, ModelEntry, StoredMessage};

/// Environment variable overriding the store file location
pub const STORE_PATH_ENV: &str = "KANAVA_STORE";

/// Terminal theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme (default)
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Parse a theme from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use kanava::store::Theme;
    ///
    /// assert_eq!(Theme::parse_str("dark").unwrap(), Theme::Dark);
    /// assert!(Theme::parse_str("sepia").is_err());
    /// ```
    pub fn parse_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// The full persisted application state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreData {
    /// Configured API channels
    #[serde(default)]
    pub api_channels: Vec<Channel>,
    /// All conversations
    #[serde(default)]
    pub conversations: Vec<Conversation>,
    /// Identifier of the active channel
    #[serde(default)]
    pub current_channel_id: Option<String>,
    /// Identifier of the active conversation
    #[serde(default)]
    pub current_conversation_id: Option<String>,
    /// Theme preference
    #[serde(default)]
    pub theme: Theme,
}

impl StoreData {
    /// Clear current-channel/conversation ids that no longer resolve
    ///
    /// Called on every load so stale references left by channel or
    /// conversation removal never leak into command handlers.
    pub fn repair(&mut self) {
        if let Some(id) = &self.current_channel_id {
            if !self.api_channels.iter().any(|c| &c.id == id) {
                tracing::warn!("Clearing dangling current channel id: {}", id);
                self.current_channel_id = None;
            }
        }
        if let Some(id) = &self.current_conversation_id {
            if !self.conversations.iter().any(|c| &c.id == id) {
                tracing::warn!("Clearing dangling current conversation id: {}", id);
                self.current_conversation_id = None;
            }
        }
    }

    /// Look up a channel by exact id
    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.api_channels.iter().find(|c| c.id == id)
    }

    /// Look up a conversation by exact id
    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Mutable conversation lookup by exact id
    pub fn conversation_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// The active channel, if one is selected
    pub fn current_channel(&self) -> Option<&Channel> {
        self.current_channel_id
            .as_deref()
            .and_then(|id| self.channel(id))
    }

    /// Resolve a user-supplied channel reference
    ///
    /// Matches an id prefix first (ids are UUIDs, so any unambiguous prefix
    /// works), then a case-insensitive name match.
    pub fn find_channel(&self, needle: &str) -> Option<&Channel> {
        self.api_channels
            .iter()
            .find(|c| c.id.starts_with(needle))
            .or_else(|| {
                self.api_channels
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(needle))
            })
    }

    /// Resolve a user-supplied conversation reference by id prefix
    pub fn find_conversation(&self, needle: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id.starts_with(needle))
    }

    /// Conversations ordered by most recent activity, newest first
    pub fn conversations_by_activity(&self) -> Vec<&Conversation> {
        let mut list: Vec<&Conversation> = self.conversations.iter().collect();
        list.sort_by_key(|c| std::cmp::Reverse(c.last_activity()));
        list
    }
}

/// File-backed store holding the JSON state document
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store at the default location
    ///
    /// The store file lives in the user's data directory. The `KANAVA_STORE`
    /// environment variable overrides the location, which makes it easy to
    /// point the binary at a test store or an alternate file.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(STORE_PATH_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("dev", "kanava", "kanava")
            .ok_or_else(|| KanavaError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| KanavaError::Storage(e.to_string()))?;

        Ok(Self {
            path: data_dir.join("store.json"),
        })
    }

    /// Create a store that uses the specified file path
    ///
    /// This is primarily useful for tests where the default application data
    /// directory is not desirable (for example, using a temporary directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use kanava::store::JsonStore;
    ///
    /// let store = JsonStore::new_with_path("/tmp/kanava_test_store.json").unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        // Ensure parent directory exists so the first save succeeds.
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create parent directory for store")
                .map_err(|e| KanavaError::Storage(e.to_string()))?;
        }

        Ok(Self { path })
    }

    /// The store file path
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the full state document
    ///
    /// A missing file yields the default empty state. An unreadable or
    /// corrupt file is logged and also yields the default state rather than
    /// failing — the store has no schema version and readers must tolerate
    /// anything that was previously written. Dangling current-ids are
    /// repaired before the state is returned.
    pub fn load(&self) -> Result<StoreData> {
        if !self.path.exists() {
            return Ok(StoreData::default());
        }

        let raw = std::fs::read_to_string(&self.path)
            .context("Failed to read store file")
            .map_err(|e| KanavaError::Storage(e.to_string()))?;

        let mut data: StoreData = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("Store file is not valid JSON, starting empty: {}", err);
                StoreData::default()
            }
        };

        data.repair();
        Ok(data)
    }

    /// Write the full state document, replacing whatever was there
    ///
    /// Last writer wins; there is no conflict detection.
    pub fn save(&self, data: &StoreData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)
            .context("Failed to write store file")
            .map_err(|e| KanavaError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Load, mutate, and save the state document in one step
    ///
    /// Every mutation in the application goes through this: the document is
    /// read wholesale, changed in memory, and written back wholesale.
    ///
    /// # Examples
    ///
    /// ```
    /// use kanava::store::{JsonStore, Theme};
    ///
    /// # fn main() -> kanava::error::Result<()> {
    /// # let dir = std::env::temp_dir().join("kanava-doc-update");
    /// # let store = JsonStore::new_with_path(dir.join("store.json"))?;
    /// let data = store.update(|data| data.theme = Theme::Dark)?;
    /// assert_eq!(data.theme, Theme::Dark);
    /// # Ok(())
    /// # }
    /// ```
    pub fn update<F>(&self, mutate: F) -> Result<StoreData>
    where
        F: FnOnce(&mut StoreData),
    {
        let mut data = self.load()?;
        mutate(&mut data);
        self.save(&data)?;
        Ok(data)
    }
}
