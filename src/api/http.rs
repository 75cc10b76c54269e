//! HTTP implementation of [`Backend`]
//!
//! Every endpoint is resolved relative to the configured base URL. The
//! session lives in a cookie jar shared by all requests; its contents can
//! be read back with [`Backend::session_cookie`] and replayed into a new
//! client so a session survives restarts.

use crate::api::stream::{decode_events, single_reply, EventStream};
use crate::api::types::{
    AuthReply, ChatReply, ChatRequest, ChatsEnvelope, CheckReply, LoginRequest, SignupRequest,
    UploadFile, UploadReceipt, UploadReply, User,
};
use crate::api::Backend;
use crate::chat::ChatMap;
use crate::config::ServerConfig;
use crate::error::{GrowthError, Result};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Growth server client
pub struct HttpBackend {
    client: Client,
    base: Url,
    jar: Arc<Jar>,
}

impl HttpBackend {
    /// Create a client for `config.base_url`
    ///
    /// `session_cookie` is a previously saved Cookie header value
    /// (`name=value; name2=value2`) to restore into the jar.
    ///
    /// # Examples
    ///
    /// ```
    /// use growth_chat::api::HttpBackend;
    /// use growth_chat::config::ServerConfig;
    ///
    /// let backend = HttpBackend::new(&ServerConfig::default(), None).unwrap();
    /// assert_eq!(backend.base_url().as_str(), "http://localhost:5000/");
    /// ```
    pub fn new(config: &ServerConfig, session_cookie: Option<&str>) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = session_cookie {
            for pair in cookie.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &base);
            }
            tracing::debug!("Restored session cookie for {}", base);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("growth-chat/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| GrowthError::Api(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized Growth backend client: base_url={}", base);

        Ok(Self { client, base, jar })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Backend returned error {}: {}", status, body);
        Err(GrowthError::Status {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read {} response body: {}", what, e);
            GrowthError::Api(format!("Failed to read {} response: {}", what, e))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse {} response: {}", what, e);
            GrowthError::Api(format!("Failed to parse {} response: {}", what, e)).into()
        })
    }

    async fn post_chat(&self, message: &str, stream: bool) -> Result<Response> {
        let url = self.endpoint("api/chat")?;
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let response = self
            .client
            .post(url)
            .header(ACCEPT, accept)
            .json(&ChatRequest { message, stream })
            .send()
            .await?;
        Self::ensure_success(response).await
    }

    /// Auth endpoints answer failures with a JSON body too, so the body is
    /// read whatever the status and `success` only holds for a 2xx.
    async fn auth_call<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthReply> {
        let url = self.endpoint(path)?;
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let mut reply: AuthReply = Self::read_json(response, path).await?;
        reply.success = reply.success && status.is_success();
        tracing::debug!("{} -> {} (success={})", path, status, reply.success);
        Ok(reply)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_chat(&self, message: &str) -> Result<ChatReply> {
        let response = self.post_chat(message, false).await?;
        Self::read_json(response, "chat").await
    }

    async fn stream_chat(&self, message: &str) -> Result<EventStream> {
        let response = self.post_chat(message, true).await?;

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        if is_json {
            tracing::debug!("Streaming request answered with a plain JSON reply");
            let reply: ChatReply = Self::read_json(response, "chat").await?;
            return Ok(single_reply(reply.reply));
        }

        Ok(decode_events(response.bytes_stream()))
    }

    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt> {
        let url = self.endpoint("api/upload")?;
        let size = file.bytes.len() as u64;
        let file_name = file.file_name.clone();

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)?;
        let form = Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let reply: UploadReply = serde_json::from_str(&body).unwrap_or_default();

        if !status.is_success() {
            let message = reply
                .error
                .unwrap_or_else(|| format!("HTTP error! Status: {}", status.as_u16()));
            tracing::warn!("Upload of {} rejected: {}", file_name, message);
            return Err(GrowthError::Upload(message).into());
        }

        Ok(UploadReceipt {
            filename: reply.filename.unwrap_or(file_name),
            size: reply.size.unwrap_or(size),
            message: reply.message,
        })
    }

    async fn login(&self, request: &LoginRequest) -> Result<AuthReply> {
        self.auth_call("api/auth/login", request).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<AuthReply> {
        self.auth_call("api/auth/signup", request).await
    }

    async fn logout(&self) -> Result<()> {
        let url = self.endpoint("api/auth/logout")?;
        let response = self.client.post(url).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn check_auth(&self) -> Result<Option<User>> {
        let url = self.endpoint("api/auth/check")?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let reply: CheckReply = Self::read_json(response, "auth check").await?;
        Ok(reply.user.filter(|_| reply.authenticated))
    }

    async fn auto_login(&self) -> Result<Option<User>> {
        let url = self.endpoint("api/auth/auto-login")?;
        let response = self.client.post(url).send().await?;
        if !response.status().is_success() {
            tracing::debug!("No remembered session ({})", response.status());
            return Ok(None);
        }
        let reply: AuthReply = Self::read_json(response, "auto-login").await?;
        Ok(reply.user.filter(|_| reply.success))
    }

    async fn fetch_chats(&self) -> Result<ChatMap> {
        let url = self.endpoint("api/user/chats")?;
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        let envelope: ChatsEnvelope = Self::read_json(response, "user chats").await?;
        Ok(envelope.chats)
    }

    async fn save_chats(&self, chats: &ChatMap) -> Result<()> {
        #[derive(serde::Serialize)]
        struct SaveRequest<'a> {
            chats: &'a ChatMap,
        }

        let url = self.endpoint("api/user/chats")?;
        let response = self
            .client
            .post(url)
            .json(&SaveRequest { chats })
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(str::to_string))
            .filter(|value| !value.is_empty())
    }
}
