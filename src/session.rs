//! Authenticated user state
//!
//! [`SessionManager`] owns the signed-in user. Besides keeping it in memory
//! it persists two things: a mirror of the user's public fields under
//! [`USER_INFO_KEY`] so other processes sharing the store can follow
//! sign-in and sign-out, and the backend session cookie under
//! [`SESSION_COOKIE_KEY`] so a later run can resume the session.

use crate::api::{Backend, LoginRequest, SignupRequest, User};
use crate::storage::LocalStore;
use std::sync::Arc;

/// Store key of the persisted user mirror
pub const USER_INFO_KEY: &str = "user_info";

/// Store key of the backend session cookie
pub const SESSION_COOKIE_KEY: &str = "growth-session";

pub const LOGIN_SUCCESS: &str = "Successfully logged in! Your chat history is now synced.";
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
pub const LOGOUT_SUCCESS: &str =
    "Successfully logged out. You can continue using the chat as a guest.";
pub const SIGNUP_SUCCESS: &str = "Account created successfully! You can now sign in.";
pub const SIGNUP_FAILED: &str = "Registration failed. Please try again.";
pub const NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";

/// Result of a login or signup request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The server accepted the request
    Accepted {
        user: Option<User>,
        message: String,
    },
    /// The server refused the request, or it never reached the server
    Rejected(String),
}

impl AuthOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Text to show the user
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message, .. } => message,
            Self::Rejected(message) => message,
        }
    }
}

/// Tracks who is signed in and keeps the persisted copies in step
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    store: LocalStore,
    user: Option<User>,
    auto_login_attempted: bool,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn Backend>, store: LocalStore) -> Self {
        Self {
            backend,
            store,
            user: None,
            auto_login_attempted: false,
        }
    }

    /// Cookie saved by an earlier run, to seed a new HTTP client with
    pub fn saved_cookie(store: &LocalStore) -> Option<String> {
        match store.get(SESSION_COOKIE_KEY) {
            Ok(cookie) => cookie.filter(|c| !c.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read saved session cookie: {}", e);
                None
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Resume a remembered session
    ///
    /// Only the first call reaches the backend; later calls return the
    /// current user. Failures leave the user signed out, including a user
    /// adopted from the mirror; a transport error keeps the saved cookie.
    pub async fn auto_login(&mut self) -> Option<User> {
        if self.auto_login_attempted {
            return self.user.clone();
        }
        self.auto_login_attempted = true;

        match self.backend.auto_login().await {
            Ok(Some(user)) => {
                tracing::info!("Resumed session for {}", user.username);
                self.set_user(Some(user));
            }
            Ok(None) => {
                tracing::debug!("No session to resume");
                if self.user.is_some() {
                    self.set_user(None);
                }
            }
            Err(e) => {
                tracing::warn!("Auto-login failed: {}", e);
                if self.user.take().is_some() {
                    self.forget_mirror();
                }
            }
        }
        self.user.clone()
    }

    /// Ask the backend who is signed in and adopt the answer
    pub async fn check_auth(&mut self) -> Option<User> {
        let user = match self.backend.check_auth().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Auth check failed: {}", e);
                None
            }
        };
        self.set_user(user);
        self.user.clone()
    }

    pub async fn login(&mut self, request: &LoginRequest) -> AuthOutcome {
        let reply = match self.backend.login(request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Login request failed: {}", e);
                return AuthOutcome::Rejected(NETWORK_ERROR.to_string());
            }
        };

        if !reply.success {
            tracing::info!("Login rejected: {:?}", reply.message);
            return AuthOutcome::Rejected(reply.message.unwrap_or_else(|| LOGIN_FAILED.to_string()));
        }

        let user = match reply.user {
            Some(user) => Some(user),
            None => self.backend.check_auth().await.unwrap_or_default(),
        };
        if let Some(user) = &user {
            tracing::info!("Signed in as {}", user.username);
        }
        self.set_user(user.clone());

        AuthOutcome::Accepted {
            user,
            message: LOGIN_SUCCESS.to_string(),
        }
    }

    /// Create an account; the new user still has to sign in
    pub async fn signup(&mut self, request: &SignupRequest) -> AuthOutcome {
        match self.backend.signup(request).await {
            Ok(reply) if reply.success => {
                tracing::info!("Account created for {}", request.username);
                AuthOutcome::Accepted {
                    user: reply.user,
                    message: SIGNUP_SUCCESS.to_string(),
                }
            }
            Ok(reply) => {
                AuthOutcome::Rejected(reply.message.unwrap_or_else(|| SIGNUP_FAILED.to_string()))
            }
            Err(e) => {
                tracing::error!("Signup request failed: {}", e);
                AuthOutcome::Rejected(NETWORK_ERROR.to_string())
            }
        }
    }

    /// Sign out; local state is cleared even when the server is unreachable
    pub async fn logout(&mut self) -> &'static str {
        if let Err(e) = self.backend.logout().await {
            tracing::warn!("Logout request failed: {}", e);
        }
        self.set_user(None);
        LOGOUT_SUCCESS
    }

    /// Follow sign-in changes made by another process sharing the store
    ///
    /// Returns true when the in-memory user changed.
    pub fn sync_from_mirror(&mut self) -> bool {
        let mirrored: Option<User> = match self.store.get_json(USER_INFO_KEY) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Failed to read user mirror: {}", e);
                return false;
            }
        };

        if mirrored == self.user {
            return false;
        }
        tracing::debug!(
            "User mirror changed: {:?} -> {:?}",
            self.user.as_ref().map(|u| &u.username),
            mirrored.as_ref().map(|u| &u.username)
        );
        self.user = mirrored;
        true
    }

    fn set_user(&mut self, user: Option<User>) {
        self.user = user;
        self.persist();
    }

    /// Drop the mirrored user but keep the saved cookie for a later retry
    fn forget_mirror(&self) {
        if let Err(e) = self.store.remove(USER_INFO_KEY) {
            tracing::warn!("Failed to update user mirror: {}", e);
        }
    }

    fn persist(&self) {
        let mirror = match &self.user {
            Some(user) => self.store.set_json(USER_INFO_KEY, user),
            None => self.store.remove(USER_INFO_KEY),
        };
        if let Err(e) = mirror {
            tracing::warn!("Failed to update user mirror: {}", e);
        }

        let cookie = match (&self.user, self.backend.session_cookie()) {
            (Some(_), Some(cookie)) => self.store.set(SESSION_COOKIE_KEY, &cookie),
            _ => self.store.remove(SESSION_COOKIE_KEY),
        };
        if let Err(e) = cookie {
            tracing::warn!("Failed to update saved session cookie: {}", e);
        }
    }
}
