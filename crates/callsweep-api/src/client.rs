use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use callsweep_records::{SessionRecord, Subject, TimeWindow};

use crate::error::ApiError;
use crate::supervisor::Handle;
use crate::traits::{Authenticate, DirectoryLookup, SessionQuery};
use crate::types::{SessionRow, TokenGrant, UserRow};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the service lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sign-in credentials. The password never appears in debug output.
#[derive(Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the session history and user directory endpoints.
pub struct ServiceClient {
    config: ClientConfig,
    http: reqwest::Client,
    full_detail: bool,
}

impl ServiceClient {
    pub fn new(config: ClientConfig, full_detail: bool) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            http,
            full_detail,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get(
        &self,
        handle: &Handle,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(handle.bearer())
            .query(query)
            .send()
            .await?;
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl SessionQuery for ServiceClient {
    async fn sessions(
        &self,
        handle: &Handle,
        subject: &Subject,
        window: TimeWindow,
    ) -> Result<Vec<SessionRecord>, ApiError> {
        debug!(
            user = %subject.uri,
            from = %window.start.to_rfc3339(),
            to = %window.end.to_rfc3339(),
            "Fetching sessions"
        );
        let query = [
            ("user", subject.uri.clone()),
            ("from", window.start.to_rfc3339()),
            ("to", window.end.to_rfc3339()),
        ];
        let rows: Vec<SessionRow> =
            decode(self.get(handle, "/api/v1/sessions", &query).await?).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_record(subject, self.full_detail))
            .collect())
    }
}

#[async_trait]
impl DirectoryLookup for ServiceClient {
    async fn enabled_users(&self, handle: &Handle) -> Result<Vec<Subject>, ApiError> {
        let query = [("enabled", "true".to_string())];
        let rows: Vec<UserRow> = decode(self.get(handle, "/api/v1/users", &query).await?).await?;
        Ok(rows.into_iter().map(Subject::from).collect())
    }

    async fn find_user(&self, handle: &Handle, uri: &str) -> Result<Option<Subject>, ApiError> {
        let query = [("uri", uri.to_string())];
        let response = self.get(handle, "/api/v1/users/lookup", &query).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let row: UserRow = decode(response).await?;
        Ok(Some(row.into()))
    }
}

/// Signs in with a username and password grant.
pub struct PasswordAuthenticator {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl PasswordAuthenticator {
    pub fn new(config: &ClientConfig, credential: Credential) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }
}

#[async_trait]
impl Authenticate for PasswordAuthenticator {
    async fn sign_in(&self) -> Result<Handle, ApiError> {
        let response = self
            .http
            .post(format!("{}/api/v1/auth/token", self.base_url))
            .json(&serde_json::json!({
                "username": self.credential.username,
                "password": self.credential.password,
            }))
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::AuthRejected(message));
        }
        let grant: TokenGrant = decode(response).await?;
        debug!(service = %self.base_url, "Signed in");
        Ok(Handle::new(grant.access_token))
    }

    async fn sign_out(&self, handle: Handle) -> Result<(), ApiError> {
        self.http
            .post(format!("{}/api/v1/auth/revoke", self.base_url))
            .bearer_auth(handle.bearer())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
