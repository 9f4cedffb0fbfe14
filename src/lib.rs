//! Server provisioning request service.
//!
//! Routes provisioning requests through the approval chain
//! (Requester → Lab Head → Vice Dean → Dean → Server Admin) and keeps the
//! per-request lifecycle records and audit trail.

pub mod api;
pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod utils;
pub mod workflow;

pub use app_state::AppState;
pub use config::Config;
pub use error::AppError;
