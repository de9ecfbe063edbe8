//! Kanava - terminal chat client library
//!
//! This library provides the core functionality for the Kanava chat client:
//! talking to user-configured OpenAI-compatible or Anthropic-compatible
//! chat-completion endpoints, streaming replies token by token, and keeping
//! channels and conversations in a local JSON store.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: HTTP request layer and the streaming delta decoder
//! - `store`: Local JSON store and the persisted record types
//! - `commands`: Handlers behind each CLI subcommand
//! - `text`: Token estimation and title heuristics
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use kanava::api::decode_stream;
//!
//! # async fn example() -> kanava::error::Result<()> {
//! # let byte_stream = futures::stream::iter(
//! #     Vec::<std::result::Result<bytes::Bytes, std::io::Error>>::new());
//! let full_text = decode_stream(byte_stream, |delta, accumulated| {
//!     print!("{}", delta);
//!     let _ = accumulated;
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod store;
pub mod text;

// Re-export commonly used types
pub use api::{ChatClient, WireMessage};
pub use config::Config;
pub use error::{KanavaError, Result};
pub use store::{Channel, Conversation, JsonStore, StoreData, StoredMessage, Theme};
pub use text::estimate_tokens;
