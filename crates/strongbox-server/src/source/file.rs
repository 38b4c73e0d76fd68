//! Local filesystem source.

use async_trait::async_trait;
use std::path::PathBuf;
use strongbox_tree::SecretTree;
use tracing::{debug, info};

use super::{DocumentFormat, LoadError, SecretSource};

/// Reads the secrets document from a local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    format: DocumentFormat,
}

impl FileSource {
    pub const fn new(path: PathBuf, format: DocumentFormat) -> Self {
        Self { path, format }
    }
}

#[async_trait]
impl SecretSource for FileSource {
    async fn load(&self) -> Result<SecretTree, LoadError> {
        debug!(path = %self.path.display(), "Reading secrets document");

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let tree = self.format.parse(&bytes).map_err(|source| LoadError::Parse {
            name: self.path.display().to_string(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            size = bytes.len(),
            entries = tree.len(),
            "Loaded secrets document"
        );

        Ok(tree)
    }

    fn describe(&self) -> String {
        format!("file://{} ({})", self.path.display(), self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use strongbox_tree::{Resolution, Resolved};

    #[tokio::test]
    async fn loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "db:\n  user: alice\nflag: \"on\"").unwrap();

        let source = FileSource::new(file.path().to_path_buf(), DocumentFormat::Yaml);
        let tree = source.load().await.unwrap();

        assert_eq!(tree.lookup("db/user"), Resolution::Found(Resolved::Scalar("alice")));
    }

    #[tokio::test]
    async fn loads_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"flag": "on"}}"#).unwrap();

        let source = FileSource::new(file.path().to_path_buf(), DocumentFormat::Json);
        let tree = source.load().await.unwrap();

        assert_eq!(tree.lookup("flag"), Resolution::Found(Resolved::Scalar("on")));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let source = FileSource::new(
            PathBuf::from("/nonexistent/strongbox/secrets.yaml"),
            DocumentFormat::Yaml,
        );
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[tokio::test]
    async fn non_mapping_document_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- just\n- a\n- list").unwrap();

        let source = FileSource::new(file.path().to_path_buf(), DocumentFormat::Yaml);
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
