use async_trait::async_trait;

use callsweep_records::{SessionRecord, Subject, TimeWindow};

use crate::error::ApiError;
use crate::supervisor::Handle;

/// Signs in to the service and produces session handles.
///
/// Sign-in failures are terminal; callers must not retry them.
#[async_trait]
pub trait Authenticate: Send + Sync {
    async fn sign_in(&self) -> Result<Handle, ApiError>;

    /// Release a handle server-side. The default just drops it.
    async fn sign_out(&self, handle: Handle) -> Result<(), ApiError> {
        drop(handle);
        Ok(())
    }
}

/// Looks up principals in the service directory.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// All enabled principals, in no particular order.
    async fn enabled_users(&self, handle: &Handle) -> Result<Vec<Subject>, ApiError>;

    /// Find one principal by canonical address, `None` when the
    /// directory has no such user.
    async fn find_user(&self, handle: &Handle, uri: &str) -> Result<Option<Subject>, ApiError>;
}

/// Fetches session history batches for one subject and window.
///
/// The service truncates every response at a fixed row cap and offers
/// no continuation token; callers walk past the cap by re-querying with
/// a narrower window.
#[async_trait]
pub trait SessionQuery: Send + Sync {
    async fn sessions(
        &self,
        handle: &Handle,
        subject: &Subject,
        window: TimeWindow,
    ) -> Result<Vec<SessionRecord>, ApiError>;
}
