//! The chat controller
//!
//! [`GrowthChat`] ties the chat collection, the session, the theme and the
//! sidebar to a [`Backend`]. Every user action the terminal front end offers
//! maps to one method here. Failures talking to the backend never escape as
//! errors: they are logged and turned into chat messages or notices, the
//! way a user would see them.

use crate::api::{Backend, HttpBackend, LoginRequest, SignupRequest, UploadFile};
use crate::chat::{ChatBook, Message, NoticeKind, Role};
use crate::config::Config;
use crate::error::Result;
use crate::render::{format_file_size, input_counter};
use crate::session::{AuthOutcome, SessionManager};
use crate::sidebar::SidebarState;
use crate::storage::LocalStore;
use crate::theme::Theme;
use crate::validation::{FormValidator, LoginForm, SignupForm, ValidationErrors};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;

pub const PROCESSING_ERROR: &str = "Sorry, there was an error processing your request.";
pub const NO_RESPONSE: &str = "No response from AI - check server logs";
pub const STREAM_ERROR: &str = "Sorry, there was an error with the streaming response.";

/// What became of a message the user tried to send
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank input or no open chat; nothing happened
    Skipped,
    /// Refused before sending; the error notice was added to the chat
    Rejected(Message),
    /// The assistant message as finally stored
    Replied(Message),
}

/// State of the input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputStatus {
    /// Character counter, e.g. `12/4000`
    pub counter: String,
    /// Whether the input may be sent
    pub can_send: bool,
}

/// Terminal chat client state
pub struct GrowthChat {
    config: Config,
    store: LocalStore,
    backend: Arc<dyn Backend>,
    book: ChatBook,
    theme: Theme,
    session: SessionManager,
    sidebar: SidebarState,
    validator: FormValidator,
    streaming: bool,
}

impl GrowthChat {
    /// Build a client over an existing store and backend
    ///
    /// Chats and the theme are loaded from the store; nothing is sent to
    /// the backend until [`GrowthChat::startup`].
    pub fn new(config: Config, store: LocalStore, backend: Arc<dyn Backend>) -> Result<Self> {
        let book = ChatBook::load(&store, config.chat.title_max_chars);
        let theme = Theme::load(&store, config.default_theme());
        let session = SessionManager::new(Arc::clone(&backend), store.clone());
        let validator = FormValidator::new()?;
        let streaming = config.server.stream;

        Ok(Self {
            config,
            store,
            backend,
            book,
            theme,
            session,
            sidebar: SidebarState::new(),
            validator,
            streaming,
        })
    }

    /// Open the configured store and connect to the configured server,
    /// restoring any saved session cookie
    pub fn connect(config: Config) -> Result<Self> {
        let store = LocalStore::open(config.storage.path.as_deref())?;
        let cookie = SessionManager::saved_cookie(&store);
        let backend = HttpBackend::new(&config.server, cookie.as_deref())?;
        let mut app = Self::new(config, store, Arc::new(backend))?;
        app.session.sync_from_mirror();
        Ok(app)
    }

    /// Resume a remembered session, pull its chats and open a chat
    pub async fn startup(&mut self) {
        if self.session.auto_login().await.is_some() {
            self.load_user_chats().await;
        }
        let current = self.book.ensure_current();
        tracing::info!(chat_id = %current, chats = self.book.len(), "Chat client ready");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn book(&self) -> &ChatBook {
        &self.book
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn sidebar(&self) -> SidebarState {
        self.sidebar
    }

    pub fn streaming(&self) -> bool {
        self.streaming
    }

    pub fn set_streaming(&mut self, streaming: bool) {
        self.streaming = streaming;
    }

    /// Counter and send-enabled state for the given input text
    pub fn input_status(&self, text: &str) -> InputStatus {
        InputStatus {
            counter: input_counter(text, self.config.chat.max_message_chars),
            can_send: !text.trim().is_empty(),
        }
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Send a message from the user and record the reply
    ///
    /// In streaming mode `on_chunk` receives reply text as it arrives; it is
    /// not called in regular mode.
    pub async fn send_message<F>(&mut self, text: &str, mut on_chunk: F) -> SendOutcome
    where
        F: FnMut(&str),
    {
        let text = text.trim();
        if text.is_empty() || self.book.current().is_none() {
            return SendOutcome::Skipped;
        }

        let max = self.config.chat.max_message_chars;
        if text.chars().count() > max {
            let notice = format!(
                "Message is too long ({} characters, limit {}).",
                text.chars().count(),
                max
            );
            return match self.book.add_notice(&notice, NoticeKind::Error) {
                Some(message) => {
                    self.save_chats().await;
                    SendOutcome::Rejected(message)
                }
                None => SendOutcome::Skipped,
            };
        }

        if self.book.add_message(Role::User, text).is_none() {
            return SendOutcome::Skipped;
        }

        let reply = if self.streaming {
            self.stream_reply(text, &mut on_chunk).await
        } else {
            self.regular_reply(text).await
        };

        self.save_chats().await;
        match reply {
            Some(message) => SendOutcome::Replied(message),
            None => SendOutcome::Skipped,
        }
    }

    async fn regular_reply(&mut self, text: &str) -> Option<Message> {
        let content = match self.backend.send_chat(text).await {
            Ok(reply) => match reply.reply.filter(|r| !r.is_empty()) {
                Some(reply) => reply,
                None => {
                    tracing::error!("No reply in chat response");
                    NO_RESPONSE.to_string()
                }
            },
            Err(e) => {
                tracing::error!("Error in AI response: {:#}", e);
                PROCESSING_ERROR.to_string()
            }
        };
        self.book.add_message(Role::Assistant, &content)
    }

    async fn stream_reply<F>(&mut self, text: &str, on_chunk: &mut F) -> Option<Message>
    where
        F: FnMut(&str),
    {
        let mut events = match self.backend.stream_chat(text).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Error in AI response: {:#}", e);
                return self.book.add_message(Role::Assistant, PROCESSING_ERROR);
            }
        };

        let message_id = self.book.add_message(Role::Assistant, "")?.id;

        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(content) = event.content.as_deref().filter(|c| !c.is_empty()) {
                        self.book.append_to_message(&message_id, content);
                        on_chunk(content);
                    }
                    if let Some(error) = &event.error {
                        tracing::warn!("Backend reported a streaming error: {}", error);
                        self.book
                            .set_message_content(&message_id, &format!("Error: {}", error));
                        break;
                    }
                    if event.done {
                        if let Some(full) = &event.full_content {
                            self.book.set_message_content(&message_id, full);
                        }
                        tracing::debug!("Streaming complete");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Streaming error: {:#}", e);
                    self.book.set_message_content(&message_id, STREAM_ERROR);
                    break;
                }
            }
        }

        let empty = self
            .book
            .message(&message_id)
            .map(|m| m.content.is_empty())
            .unwrap_or(false);
        if empty {
            tracing::error!("No reply in streamed chat response");
            self.book.set_message_content(&message_id, NO_RESPONSE);
        }

        self.book.message(&message_id).cloned()
    }

    // -----------------------------------------------------------------------
    // Uploads
    // -----------------------------------------------------------------------

    /// Upload a document, recording progress and result notices
    ///
    /// Returns the notices added, in order.
    pub async fn upload_file(&mut self, path: &Path) -> Vec<Message> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let mut notices = Vec::new();
        notices.extend(self.notice(&format!("📤 Uploading \"{}\"...", name), NoticeKind::Info));

        let result = match UploadFile::from_path(path).await {
            Ok(file) => self.backend.upload(file).await,
            Err(e) => Err(e),
        };

        let notice = match result {
            Ok(receipt) => {
                tracing::info!(file = %receipt.filename, size = receipt.size, "Upload complete");
                let text = receipt.message.unwrap_or_else(|| {
                    format!(
                        "✅ Successfully uploaded \"{}\" ({}). You can now ask me to analyze this document!",
                        receipt.filename,
                        format_file_size(receipt.size)
                    )
                });
                self.notice(&text, NoticeKind::Success)
            }
            Err(e) => {
                tracing::error!("Upload error: {:#}", e);
                self.notice(&format!("❌ Upload failed: {}", upload_error_text(&e)), NoticeKind::Error)
            }
        };
        notices.extend(notice);
        notices
    }

    // -----------------------------------------------------------------------
    // Chats
    // -----------------------------------------------------------------------

    /// Start a new chat, closing the sidebar
    pub async fn new_chat(&mut self) -> String {
        let id = self.book.create_new_chat();
        self.sidebar.close();
        self.save_chats().await;
        id
    }

    /// Open a chat, closing the sidebar; unknown ids change nothing
    pub fn load_chat(&mut self, id: &str) -> bool {
        if !self.book.load_chat(id) {
            return false;
        }
        self.sidebar.close();
        true
    }

    /// Delete a chat; unknown ids change nothing
    pub async fn delete_chat(&mut self, id: &str) -> bool {
        if !self.book.delete_chat(id) {
            return false;
        }
        self.save_chats().await;
        true
    }

    /// Resolve a chat id or `#position` from the history listing
    pub fn resolve_chat(&self, selector: &str) -> Option<String> {
        self.book.resolve(selector)
    }

    /// Save chats locally and, when signed in, to the server
    ///
    /// Failures are logged only.
    pub async fn save_chats(&mut self) {
        if let Err(e) = self.book.save(&self.store) {
            tracing::error!("Error saving chats: {:#}", e);
        }
        if self.session.is_authenticated() {
            if let Err(e) = self.backend.save_chats(self.book.chats()).await {
                tracing::error!("Error saving chats to backend: {:#}", e);
            }
        }
    }

    /// Merge the signed-in user's server chats into the local ones
    ///
    /// Returns false when the server could not be read.
    pub async fn load_user_chats(&mut self) -> bool {
        match self.backend.fetch_chats().await {
            Ok(chats) => {
                self.book.merge(chats);
                self.book.ensure_current();
                self.save_chats().await;
                true
            }
            Err(e) => {
                tracing::error!("Failed to load user chats: {:#}", e);
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Theme and sidebar
    // -----------------------------------------------------------------------

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled())
    }

    pub fn set_theme(&mut self, theme: Theme) -> Theme {
        self.theme = theme;
        if let Err(e) = theme.save(&self.store) {
            tracing::error!("Error saving theme: {:#}", e);
        }
        theme
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar.toggle()
    }

    pub fn close_sidebar(&mut self) {
        self.sidebar.close();
    }

    // -----------------------------------------------------------------------
    // Authentication
    // -----------------------------------------------------------------------

    /// Validate and submit the login form
    ///
    /// On success the user's server chats are merged in and a success notice
    /// is added to the open chat.
    pub async fn login(&mut self, form: &LoginForm) -> std::result::Result<AuthOutcome, ValidationErrors> {
        self.validator.validate_login(form)?;

        let request = LoginRequest {
            email: form.identifier.trim().to_string(),
            password: form.password.clone(),
            remember_me: form.remember_me,
        };
        let outcome = self.session.login(&request).await;
        if outcome.is_accepted() {
            self.load_user_chats().await;
            self.notice(outcome.message(), NoticeKind::Success);
            self.save_chats().await;
        }
        Ok(outcome)
    }

    /// Validate and submit the signup form
    pub async fn signup(&mut self, form: &SignupForm) -> std::result::Result<AuthOutcome, ValidationErrors> {
        self.validator.validate_signup(form)?;

        let request = SignupRequest {
            email: form.email.trim().to_string(),
            username: form.username.trim().to_string(),
            password: form.password.clone(),
        };
        Ok(self.session.signup(&request).await)
    }

    /// Sign out and continue as a guest
    pub async fn logout(&mut self) -> Option<Message> {
        let text = self.session.logout().await;
        let notice = self.notice(text, NoticeKind::Info);
        self.save_chats().await;
        notice
    }

    /// Ask the backend who is signed in
    pub async fn check_auth(&mut self) -> bool {
        self.session.check_auth().await.is_some()
    }

    /// Adopt sign-in changes made by another process; true when changed
    pub fn sync_session(&mut self) -> bool {
        self.session.sync_from_mirror()
    }

    fn notice(&mut self, text: &str, kind: NoticeKind) -> Option<Message> {
        self.book.add_notice(text, kind)
    }
}

/// Text shown after `❌ Upload failed: `
fn upload_error_text(error: &anyhow::Error) -> String {
    match error.downcast_ref::<crate::error::GrowthError>() {
        Some(crate::error::GrowthError::Upload(message)) => message.clone(),
        _ => error.to_string(),
    }
}
