//! Server middleware.

pub mod auth;
pub mod security;
pub mod trace;

pub use auth::{authorize, AccessGate, TokenAuthLayer};
pub use security::SecurityLayer;
pub use trace::RequestTraceLayer;
