//! Error types for secret tree construction.

use thiserror::Error;

/// Errors that can occur while building a [`SecretTree`](crate::SecretTree)
/// from a source document.
///
/// These are startup-time conditions. Per-request outcomes such as a missing
/// path or a malformed node are ordinary [`Resolution`](crate::Resolution)
/// values, not errors.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The document is not valid YAML.
    #[error("invalid YAML secrets document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not valid JSON.
    #[error("invalid JSON secrets document: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed, but its root is not a string-keyed mapping.
    #[error("secrets document root must be a mapping, found {found}")]
    RootNotMapping {
        /// Description of what was found at the root.
        found: String,
    },
}
