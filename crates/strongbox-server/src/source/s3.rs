//! Object storage source.

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, ObjectStoreExt};
use std::sync::Arc;
use strongbox_tree::SecretTree;
use tracing::{debug, info};

use super::{DocumentFormat, LoadError, SecretSource};
use crate::config::S3SourceConfig;

/// Fetches the secrets document from S3 or any other [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct ObjectStoreSource {
    store: Arc<dyn ObjectStore>,
    location: String,
    key: String,
    format: DocumentFormat,
}

impl ObjectStoreSource {
    /// Creates a source reading `key` from an existing store.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        location: impl Into<String>,
        key: impl Into<String>,
        format: DocumentFormat,
    ) -> Self {
        Self {
            store,
            location: location.into(),
            key: key.into(),
            format,
        }
    }

    /// Creates an S3 source from configuration.
    ///
    /// Credentials and any unset options come from the `AWS_*` environment.
    pub fn from_config(config: &S3SourceConfig) -> Result<Self, LoadError> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&config.bucket);

        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| LoadError::ClientCreation(e.to_string()))?;

        info!(
            bucket = %config.bucket,
            region = config.region.as_deref().unwrap_or("from environment"),
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "S3 client created"
        );

        let format = config
            .format
            .unwrap_or_else(|| DocumentFormat::infer(&config.key));

        Ok(Self::new(
            Arc::new(store),
            format!("s3://{}", config.bucket),
            config.key.clone(),
            format,
        ))
    }
}

#[async_trait]
impl SecretSource for ObjectStoreSource {
    async fn load(&self) -> Result<SecretTree, LoadError> {
        debug!(location = %self.location, key = %self.key, "Fetching secrets document");

        let path =
            ObjectPath::parse(&self.key).map_err(|e| LoadError::InvalidPath(e.to_string()))?;

        let result = self
            .store
            .get(&path)
            .await
            .map_err(|source| LoadError::ObjectStore {
                key: self.key.clone(),
                source,
            })?;

        let bytes = result.bytes().await.map_err(|source| LoadError::ObjectStore {
            key: self.key.clone(),
            source,
        })?;

        let tree = self.format.parse(&bytes).map_err(|source| LoadError::Parse {
            name: self.key.clone(),
            source,
        })?;

        info!(
            location = %self.location,
            key = %self.key,
            size = bytes.len(),
            entries = tree.len(),
            "Loaded secrets document"
        );

        Ok(tree)
    }

    fn describe(&self) -> String {
        format!("{}/{} ({})", self.location, self.key, self.format)
    }
}
