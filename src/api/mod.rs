//! Backend client
//!
//! [`Backend`] is the seam between the chat controller and the Growth
//! server. [`HttpBackend`] talks to a real server over HTTP with a cookie
//! session. Unit tests use an in-process fake.

pub mod http;
pub mod stream;
pub mod types;

#[cfg(test)]
pub mod fake;

pub use http::HttpBackend;
pub use stream::{decode_events, single_reply, EventStream, LineDecoder};
pub use types::{
    AuthReply, ChatReply, LoginRequest, SignupRequest, StreamEvent, UploadFile, UploadReceipt,
    User,
};

#[cfg(test)]
pub use fake::FakeBackend;

use crate::chat::ChatMap;
use crate::error::Result;
use async_trait::async_trait;

/// Operations the chat client needs from the server
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send a message and wait for the whole reply
    async fn send_chat(&self, message: &str) -> Result<ChatReply>;

    /// Send a message and receive the reply as it is produced
    async fn stream_chat(&self, message: &str) -> Result<EventStream>;

    /// Upload a document for later analysis
    ///
    /// A rejected upload is a [`GrowthError::Upload`](crate::error::GrowthError::Upload)
    /// carrying the server's message.
    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt>;

    async fn login(&self, request: &LoginRequest) -> Result<AuthReply>;

    async fn signup(&self, request: &SignupRequest) -> Result<AuthReply>;

    async fn logout(&self) -> Result<()>;

    /// Current session user, `None` when not signed in
    async fn check_auth(&self) -> Result<Option<User>>;

    /// Resume a remembered session, `None` when there is nothing to resume
    async fn auto_login(&self) -> Result<Option<User>>;

    /// Chats stored on the server for the signed-in user
    async fn fetch_chats(&self) -> Result<ChatMap>;

    /// Replace the signed-in user's chats on the server
    async fn save_chats(&self, chats: &ChatMap) -> Result<()>;

    /// Cookie header value identifying the current session, if any
    fn session_cookie(&self) -> Option<String>;
}
