//! Request and response bodies exchanged with the backend

use crate::chat::ChatMap;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub stream: bool,
}

/// Non-streamed chat reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: Option<String>,
}

/// One `data:` payload of a streamed chat reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Text to append to the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// The reply is complete
    #[serde(default)]
    pub done: bool,
    /// Complete reply text, sent with `done`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_content: Option<String>,
    /// The backend failed while producing the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamEvent {
    pub fn content(text: &str) -> Self {
        Self {
            content: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Default::default()
        }
    }

    /// No further events follow this one
    pub fn is_terminal(&self) -> bool {
        self.done || self.error.is_some()
    }
}

/// Signed-in user as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address or username
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Reply of the login, signup, logout and auto-login endpoints
///
/// `success` is only true when the body says so and the status was 2xx.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Reply of `GET /api/auth/check`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckReply {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<User>,
}

/// Raw reply of `POST /api/upload`, success or failure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A file ready to be sent as the `file` part of an upload
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Read a file from disk, guessing its content type from the extension
    ///
    /// # Examples
    ///
    /// ```
    /// use growth_chat::api::UploadFile;
    ///
    /// # tokio_test::block_on(async {
    /// let dir = tempfile::TempDir::new().unwrap();
    /// let path = dir.path().join("report.pdf");
    /// std::fs::write(&path, b"%PDF-1.4").unwrap();
    ///
    /// let file = UploadFile::from_path(&path).await.unwrap();
    /// assert_eq!(file.file_name, "report.pdf");
    /// assert_eq!(file.mime, "application/pdf");
    /// # });
    /// ```
    pub async fn from_path(path: &std::path::Path) -> crate::error::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

/// Accepted upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub filename: String,
    pub size: u64,
    /// Server-provided text shown instead of the default success notice
    pub message: Option<String>,
}

/// Body of `GET`/`POST /api/user/chats`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatsEnvelope {
    #[serde(default)]
    pub chats: ChatMap,
}
