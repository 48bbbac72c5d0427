//! HTTP query surface for the message history.
//!
//! Routes:
//! - `GET /`: dashboard page polling the API
//! - `GET /api`: endpoint index
//! - `GET /api/messages`: newest 100 messages
//! - `GET /api/messages/:limit`: newest `limit` messages
//! - `GET /api/health`: liveness
//!
//! Every request is served on its own task; store reads run on the blocking
//! pool so a slow database never stalls the runtime.

pub mod config;
mod dashboard;
pub mod error;
pub mod routes;
pub mod server;

pub use config::{ApiConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_REFRESH_INTERVAL};
pub use error::ApiError;
pub use routes::{router, MessagesResponse};
pub use server::{bind, serve};
