use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::traits::Authenticate;

/// How old a handle may grow before `ensure_live` replaces it. Hosted
/// deployments retire sessions not long after this, so we stay ahead.
pub const HANDLE_MAX_AGE: Duration = Duration::from_secs(45 * 60);

/// Pause before reconnecting after a failed query.
pub const RENEW_BACKOFF: Duration = Duration::from_secs(10);

/// An authenticated session with the service.
///
/// Only the supervisor creates and retires handles; everything else
/// borrows one just long enough to issue a request.
#[derive(Debug)]
pub struct Handle {
    token: String,
    opened_at: Instant,
}

impl Handle {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            opened_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }

    pub(crate) fn bearer(&self) -> &str {
        &self.token
    }
}

/// Owns the service session across a long scan.
///
/// Every request path goes through [`ensure_live`](Self::ensure_live)
/// first and gets a handle younger than [`HANDLE_MAX_AGE`].
pub struct ConnectionSupervisor {
    auth: Box<dyn Authenticate>,
    handle: Option<Handle>,
    max_age: Duration,
    renew_backoff: Duration,
}

impl ConnectionSupervisor {
    pub fn new(auth: Box<dyn Authenticate>) -> Self {
        Self {
            auth,
            handle: None,
            max_age: HANDLE_MAX_AGE,
            renew_backoff: RENEW_BACKOFF,
        }
    }

    /// Borrow a handle no older than the freshness threshold, signing in
    /// again when the current one has aged out.
    pub async fn ensure_live(&mut self) -> Result<&Handle, ApiError> {
        let renew = match self.handle {
            None => true,
            Some(ref handle) => {
                let age = handle.age();
                if age >= self.max_age {
                    info!(age_secs = age.as_secs(), "Service session aged out; renewing");
                    true
                } else {
                    false
                }
            }
        };

        if renew {
            self.establish(false).await?;
        }

        self.handle.as_ref().ok_or(ApiError::HandleClosed)
    }

    /// Discard the current handle and sign in again after a short pause.
    /// For when a query failed and the session is suspect.
    pub async fn force_renew(&mut self) -> Result<&Handle, ApiError> {
        self.establish(true).await?;
        self.handle.as_ref().ok_or(ApiError::HandleClosed)
    }

    /// Release the current handle, telling the service when possible.
    pub async fn sign_out(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.auth.sign_out(handle).await {
                debug!(error = %e, "Sign-out failed; dropping handle anyway");
            }
        }
    }

    async fn establish(&mut self, backoff: bool) -> Result<(), ApiError> {
        self.handle = None;
        if backoff {
            debug!(
                secs = self.renew_backoff.as_secs(),
                "Pausing before reconnect"
            );
            tokio::time::sleep(self.renew_backoff).await;
        }
        let handle = self.auth.sign_in().await?;
        debug!("Service session established");
        self.handle = Some(handle);
        Ok(())
    }
}
