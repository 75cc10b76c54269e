//! Growth Chat - terminal client for the Growth assistant
//!
//! This library provides the pieces of the `growth` command-line client:
//! chat history kept in a local store, a backend client with a cookie
//! session and streamed replies, account handling, form validation and
//! terminal rendering.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `app`: the [`GrowthChat`] controller tying everything together
//! - `api`: backend trait, HTTP client and streamed reply reader
//! - `chat`: chat and message records and the chat collection
//! - `session`: signed-in user state and its persisted copies
//! - `storage`: local key-value store
//! - `validation`: login and signup form rules
//! - `theme`, `sidebar`, `render`: terminal presentation
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`, `commands`: command-line interface and its handlers
//!
//! # Example
//!
//! ```no_run
//! use growth_chat::{Config, GrowthChat};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let mut app = GrowthChat::connect(config)?;
//!     app.startup().await;
//!     app.send_message("Hello!", |chunk| print!("{}", chunk)).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod app;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod session;
pub mod sidebar;
pub mod storage;
pub mod theme;
pub mod validation;

// Re-export commonly used types
pub use app::{GrowthChat, SendOutcome};
pub use chat::{Chat, ChatBook, Message, NoticeKind, Role};
pub use config::Config;
pub use error::{GrowthError, Result};
pub use theme::Theme;

#[cfg(test)]
pub mod test_utils;
