//! Secrets document sources.
//!
//! A source is consulted exactly once, at startup, to produce the
//! [`SecretTree`] served for the lifetime of the process. Any failure here is
//! fatal.

mod file;
mod s3;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use strongbox_tree::{SecretTree, TreeError};
use thiserror::Error;

use crate::config::SourceConfig;

pub use file::FileSource;
pub use s3::ObjectStoreSource;

/// Errors that can occur while loading the secrets document.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading a local document failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Building the object store client failed.
    #[error("failed to create object store client: {0}")]
    ClientCreation(String),

    /// The object key is not a valid object store path.
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    /// Fetching the document from the object store failed.
    #[error("failed to fetch '{key}': {source}")]
    ObjectStore {
        key: String,
        #[source]
        source: object_store::Error,
    },

    /// The document could not be turned into a secret tree.
    #[error("failed to parse '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: TreeError,
    },
}

/// Serialisation format of a secrets document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Infers the format from a file name or object key.
    ///
    /// `.json` selects JSON; anything else is read as YAML.
    #[must_use]
    pub fn infer(name: impl AsRef<Path>) -> Self {
        match name.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Parses a document in this format.
    pub fn parse(self, bytes: &[u8]) -> Result<SecretTree, TreeError> {
        match self {
            Self::Yaml => SecretTree::from_yaml_slice(bytes),
            Self::Json => SecretTree::from_json_slice(bytes),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => f.write_str("yaml"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// A place the secrets document can be loaded from.
#[async_trait]
pub trait SecretSource: Send + Sync + fmt::Debug {
    /// Fetches and parses the document.
    async fn load(&self) -> Result<SecretTree, LoadError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Builds the source described by the configuration.
pub fn from_config(config: &SourceConfig) -> Result<Box<dyn SecretSource>, LoadError> {
    match config {
        SourceConfig::File { path, format } => {
            let format = format.unwrap_or_else(|| DocumentFormat::infer(path));
            Ok(Box::new(FileSource::new(path.clone(), format)))
        }
        SourceConfig::S3(s3) => Ok(Box::new(ObjectStoreSource::from_config(s3)?)),
    }
}
