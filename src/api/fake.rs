//! In-process fake backend for unit tests
//!
//! [`FakeBackend`] keeps accounts, the session and server-side chats in
//! memory and records every call, so the chat controller can be driven
//! end to end without a server.

use crate::api::stream::{decode_events, EventStream};
use crate::api::types::{
    AuthReply, ChatReply, LoginRequest, SignupRequest, UploadFile, UploadReceipt, User,
};
use crate::api::Backend;
use crate::chat::ChatMap;
use crate::error::{GrowthError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct FakeState {
    reply: Option<String>,
    stream_body: Vec<Vec<u8>>,
    stream_failure: Option<String>,
    chat_status: Option<u16>,
    upload_error: Option<String>,
    accounts: Vec<(User, String)>,
    session: Option<User>,
    server_chats: ChatMap,
    offline: bool,
    calls: Vec<String>,
    uploads: Vec<UploadFile>,
    saves: usize,
}

/// Scriptable in-memory [`Backend`]
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply returned by non-streamed chat requests
    pub fn with_reply(self, reply: &str) -> Self {
        self.state().reply = Some(reply.to_string());
        self
    }

    /// Raw body chunks returned by streamed chat requests
    pub fn with_stream_body(self, chunks: &[&str]) -> Self {
        self.state().stream_body = chunks.iter().map(|c| c.as_bytes().to_vec()).collect();
        self
    }

    /// Make the streamed body fail after its chunks
    pub fn with_stream_failure(self, message: &str) -> Self {
        self.state().stream_failure = Some(message.to_string());
        self
    }

    /// Answer chat requests with this HTTP status
    pub fn with_chat_status(self, status: u16) -> Self {
        self.state().chat_status = Some(status);
        self
    }

    /// Reject uploads with this server message
    pub fn with_upload_error(self, message: &str) -> Self {
        self.state().upload_error = Some(message.to_string());
        self
    }

    /// Register an account that can sign in by username or email
    pub fn with_account(self, username: &str, email: &str, password: &str) -> Self {
        {
            let mut state = self.state();
            let user = User {
                id: format!("user-{}", state.accounts.len() + 1),
                username: username.to_string(),
                email: email.to_string(),
            };
            state.accounts.push((user, password.to_string()));
        }
        self
    }

    /// Start with `username` already signed in (a remembered session)
    pub fn with_session(self, username: &str) -> Self {
        {
            let mut state = self.state();
            state.session = state
                .accounts
                .iter()
                .find(|(u, _)| u.username == username)
                .map(|(u, _)| u.clone());
        }
        self
    }

    /// Chats stored on the server for the signed-in user
    pub fn with_server_chats(self, chats: ChatMap) -> Self {
        self.state().server_chats = chats;
        self
    }

    /// Fail every call as if the server were unreachable
    pub fn offline(self) -> Self {
        self.state().offline = true;
        self
    }

    /// Names of the operations called so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of calls to `name`
    pub fn call_count(&self, name: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == name).count()
    }

    /// Chats currently stored on the server
    pub fn server_chats(&self) -> ChatMap {
        self.state().server_chats.clone()
    }

    /// Number of successful chat saves
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    /// Files received so far
    pub fn uploaded_files(&self) -> Vec<String> {
        self.state()
            .uploads
            .iter()
            .map(|f| f.file_name.clone())
            .collect()
    }

    /// User of the current session
    pub fn session_user(&self) -> Option<User> {
        self.state().session.clone()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, name: &str) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.calls.push(name.to_string());
        if state.offline {
            return Err(GrowthError::Api("connection refused".to_string()).into());
        }
        Ok(state)
    }

    fn unauthorized() -> anyhow::Error {
        GrowthError::Status {
            status: 401,
            body: r#"{"error":"Authentication required"}"#.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn send_chat(&self, _message: &str) -> Result<ChatReply> {
        let state = self.enter("send_chat")?;
        if let Some(status) = state.chat_status {
            return Err(GrowthError::Status {
                status,
                body: String::new(),
            }
            .into());
        }
        Ok(ChatReply {
            reply: state.reply.clone(),
        })
    }

    async fn stream_chat(&self, _message: &str) -> Result<EventStream> {
        let state = self.enter("stream_chat")?;
        if let Some(status) = state.chat_status {
            return Err(GrowthError::Status {
                status,
                body: String::new(),
            }
            .into());
        }
        let mut items: Vec<std::result::Result<Bytes, String>> = state
            .stream_body
            .iter()
            .map(|chunk| Ok(Bytes::from(chunk.clone())))
            .collect();
        if let Some(failure) = &state.stream_failure {
            items.push(Err(failure.clone()));
        }
        Ok(decode_events(futures::stream::iter(items)))
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt> {
        let mut state = self.enter("upload")?;
        if let Some(error) = &state.upload_error {
            return Err(GrowthError::Upload(error.clone()).into());
        }
        let receipt = UploadReceipt {
            filename: file.file_name.clone(),
            size: file.bytes.len() as u64,
            message: None,
        };
        state.uploads.push(file);
        Ok(receipt)
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthReply> {
        let mut state = self.enter("login")?;
        let found = state
            .accounts
            .iter()
            .find(|(u, pw)| {
                (u.username == request.email || u.email == request.email)
                    && *pw == request.password
            })
            .map(|(u, _)| u.clone());

        match found {
            Some(user) => {
                state.session = Some(user.clone());
                Ok(AuthReply {
                    success: true,
                    message: Some("Login successful!".to_string()),
                    user: Some(user),
                })
            }
            None => Ok(AuthReply {
                success: false,
                message: Some("Invalid email/username or password".to_string()),
                user: None,
            }),
        }
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthReply> {
        let mut state = self.enter("signup")?;
        if state.accounts.iter().any(|(u, _)| u.email == request.email) {
            return Ok(AuthReply {
                success: false,
                message: Some("Email already registered".to_string()),
                user: None,
            });
        }
        if state
            .accounts
            .iter()
            .any(|(u, _)| u.username == request.username)
        {
            return Ok(AuthReply {
                success: false,
                message: Some("Username already taken".to_string()),
                user: None,
            });
        }
        let user = User {
            id: format!("user-{}", state.accounts.len() + 1),
            username: request.username.clone(),
            email: request.email.clone(),
        };
        state.accounts.push((user.clone(), request.password.clone()));
        Ok(AuthReply {
            success: true,
            message: Some("Account created successfully".to_string()),
            user: Some(user),
        })
    }

    async fn logout(&self) -> Result<()> {
        let mut state = self.enter("logout")?;
        state.session = None;
        Ok(())
    }

    async fn check_auth(&self) -> Result<Option<User>> {
        let state = self.enter("check_auth")?;
        Ok(state.session.clone())
    }

    async fn auto_login(&self) -> Result<Option<User>> {
        let state = self.enter("auto_login")?;
        Ok(state.session.clone())
    }

    async fn fetch_chats(&self) -> Result<ChatMap> {
        let state = self.enter("fetch_chats")?;
        if state.session.is_none() {
            return Err(Self::unauthorized());
        }
        Ok(state.server_chats.clone())
    }

    async fn save_chats(&self, chats: &ChatMap) -> Result<()> {
        let mut state = self.enter("save_chats")?;
        if state.session.is_none() {
            return Err(Self::unauthorized());
        }
        state.server_chats = chats.clone();
        state.saves += 1;
        Ok(())
    }

    fn session_cookie(&self) -> Option<String> {
        self.state()
            .session
            .as_ref()
            .map(|u| format!("session={}", u.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn login_request(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: identifier.to_string(),
            password: password.to_string(),
            remember_me: false,
        }
    }

    #[tokio::test]
    async fn test_login_by_email_or_username() {
        let backend = FakeBackend::new().with_account("alice", "alice@example.com", "Secret123");

        let reply = backend
            .login(&login_request("alice@example.com", "Secret123"))
            .await
            .unwrap();
        assert!(reply.success);
        assert_eq!(reply.user.unwrap().username, "alice");

        let reply = backend.login(&login_request("alice", "wrong")).await.unwrap();
        assert!(!reply.success);
    }

    #[tokio::test]
    async fn test_chats_require_session() {
        let backend = FakeBackend::new();
        let err = backend.fetch_chats().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let backend = FakeBackend::new().offline();
        assert!(backend.check_auth().await.is_err());
        assert!(backend.send_chat("hi").await.is_err());
        assert_eq!(backend.calls(), vec!["check_auth", "send_chat"]);
    }

    #[tokio::test]
    async fn test_stream_body_is_decoded() {
        let backend = FakeBackend::new().with_stream_body(&[
            "data: {\"content\":\"Hi\"}\n\n",
            "data: {\"done\":true}\n\n",
        ]);
        let events: Vec<_> = backend.stream_chat("hello").await.unwrap().collect().await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_logout_clears_session_cookie() {
        let backend = FakeBackend::new()
            .with_account("alice", "alice@example.com", "Secret123")
            .with_session("alice");
        assert_eq!(backend.session_cookie().as_deref(), Some("session=user-1"));
        backend.logout().await.unwrap();
        assert!(backend.session_cookie().is_none());
    }
}
