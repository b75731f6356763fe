//! Admin Gate - access control for an administrative console
//!
//! Role and permission grids, one-time access-code invitations, the access
//! gate in front of every admin operation and an append-only audit ledger.

pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod rate_limit;
pub mod server;

pub use context::AppContext;
pub use error::{AdminError, AdminResult};
