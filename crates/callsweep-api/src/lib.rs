//! # callsweep-api
//!
//! HTTP access to the hosted session history service: authentication,
//! directory lookups, history queries, and connection supervision.
//!
//! ## Key Types
//!
//! - [`ServiceClient`] - Directory and history queries over HTTP
//! - [`ConnectionSupervisor`] - Owns the session [`Handle`] and keeps it fresh
//! - [`SessionQuery`] / [`DirectoryLookup`] / [`Authenticate`] - Seams for the scan engine

mod client;
mod error;
mod supervisor;
mod traits;
mod types;

pub use client::{ClientConfig, Credential, PasswordAuthenticator, ServiceClient};
pub use error::ApiError;
pub use supervisor::{ConnectionSupervisor, Handle, HANDLE_MAX_AGE, RENEW_BACKOFF};
pub use traits::{Authenticate, DirectoryLookup, SessionQuery};
pub use types::{SessionRow, UserRow};
