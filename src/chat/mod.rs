//! Chat data model
//!
//! - `types`: serializable [`Chat`] and [`Message`] records
//! - `book`: [`ChatBook`], the chat collection with its current chat

pub mod book;
pub mod types;

pub use book::{ChatBook, IdClock, CHATS_KEY, DEFAULT_TITLE};
pub use types::{truncate_title, Chat, ChatMap, Message, NoticeKind, Role};
