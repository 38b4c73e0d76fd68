//! Client library for the Strongbox secret server.
//!
//! ```no_run
//! use strongbox_client::SecretsClient;
//!
//! # async fn example() -> Result<(), strongbox_client::ClientError> {
//! let client = SecretsClient::new("http://localhost:8420", "s3cret")?;
//!
//! match client.get_secret("db/pass").await {
//!     Ok(pass) => println!("got {} bytes", pass.len()),
//!     Err(e) if e.is_not_found() => println!("no password configured"),
//!     Err(e) => return Err(e),
//! }
//!
//! let db = client.get_secrets("db").await?;
//! println!("{} keys under db", db.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;

pub use client::{SecretMap, SecretsApi, SecretsClient};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
