//! HTTP secret server for Strongbox.
//!
//! Loads a secrets document once at startup and serves it read-only over
//! HTTP. `GET /<path>?token=<token>` returns a scalar secret as plain text or
//! a group of secrets as a JSON object.

pub mod config;
pub mod error;
pub mod middleware;
pub mod server;
pub mod source;

pub use config::StrongboxConfig;
pub use error::ServerError;
pub use server::{router, run, serve};
