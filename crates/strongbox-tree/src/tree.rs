//! The loaded secret tree.

use crate::error::TreeError;
use crate::path::SecretPath;
use crate::resolve::{resolve, Resolution};
use crate::types::{SecretNode, Subtree};

/// An immutable tree of secrets rooted at a mapping.
///
/// Built once at startup and shared read-only between request handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretTree {
    root: Subtree,
}

impl SecretTree {
    /// Creates a tree from an already-built root mapping.
    #[must_use]
    pub const fn new(root: Subtree) -> Self {
        Self { root }
    }

    /// Builds a tree from a root node, which must be a subtree.
    pub fn from_node(node: SecretNode) -> Result<Self, TreeError> {
        match node {
            SecretNode::Subtree(root) => Ok(Self { root }),
            SecretNode::Scalar(_) => Err(TreeError::RootNotMapping {
                found: "string".to_owned(),
            }),
            SecretNode::Invalid(kind, _) => Err(TreeError::RootNotMapping {
                found: kind.to_string(),
            }),
        }
    }

    /// Parses a YAML document.
    ///
    /// Merge keys (`<<: *anchor`) are expanded before the tree is built.
    pub fn from_yaml_slice(bytes: &[u8]) -> Result<Self, TreeError> {
        let mut value: serde_yaml::Value = serde_yaml::from_slice(bytes)?;
        value.apply_merge()?;
        Self::from_node(SecretNode::from(value))
    }

    /// Parses a YAML document from a string.
    pub fn from_yaml_str(content: &str) -> Result<Self, TreeError> {
        Self::from_yaml_slice(content.as_bytes())
    }

    /// Parses a JSON document.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, TreeError> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_node(SecretNode::from(value))
    }

    /// Returns the root mapping.
    #[must_use]
    pub const fn root(&self) -> &Subtree {
        &self.root
    }

    /// Resolves a parsed path.
    #[must_use]
    pub fn resolve(&self, path: &SecretPath) -> Resolution<'_> {
        resolve(&self.root, path)
    }

    /// Parses and resolves a raw slash-delimited path.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Resolution<'_> {
        self.resolve(&SecretPath::parse(raw))
    }

    /// Returns the number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns true if no node in the tree holds an unsupported value.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.root.values().all(SecretNode::is_well_formed)
    }

    /// Returns true if the tree has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

impl From<Subtree> for SecretTree {
    fn from(root: Subtree) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolved;
    use crate::types::InvalidKind;

    const SECRETS_YAML: &str = r#"
db:
  user: alice
  pass: hunter2
flag: "on"
service:
  api:
    key: sk_live_123
  timeout: 30
"#;

    #[test]
    fn parses_yaml_document() {
        let tree = SecretTree::from_yaml_str(SECRETS_YAML).unwrap();

        assert_eq!(tree.len(), 3);
        assert_eq!(
            tree.lookup("db/user"),
            Resolution::Found(Resolved::Scalar("alice"))
        );
        assert_eq!(
            tree.lookup("service/api/key"),
            Resolution::Found(Resolved::Scalar("sk_live_123"))
        );
    }

    #[test]
    fn invalid_values_are_detected_lazily() {
        let tree = SecretTree::from_yaml_str(SECRETS_YAML).unwrap();

        assert_eq!(
            tree.root()["service"].as_subtree().unwrap()["timeout"].invalid_kind(),
            Some(InvalidKind::Number)
        );
        assert_eq!(tree.lookup("service/timeout"), Resolution::Malformed { depth: 1 });
        assert!(!tree.is_well_formed());
        assert!(tree.lookup("service/api").is_found());
    }

    #[test]
    fn applies_yaml_merge_keys() {
        let tree = SecretTree::from_yaml_str(
            r#"
base: &base
  user: alice
  pass: default
prod:
  <<: *base
  pass: hunter2
"#,
        )
        .unwrap();

        assert_eq!(
            tree.lookup("prod/user"),
            Resolution::Found(Resolved::Scalar("alice"))
        );
        assert_eq!(
            tree.lookup("prod/pass"),
            Resolution::Found(Resolved::Scalar("hunter2"))
        );

        let Resolution::Found(Resolved::Subtree(prod)) = tree.lookup("prod") else {
            panic!("expected subtree");
        };
        assert!(!prod.contains_key("<<"));
        assert_eq!(prod.len(), 2);
    }

    #[test]
    fn parses_json_document() {
        let tree =
            SecretTree::from_json_slice(br#"{"db": {"user": "alice"}, "flag": "on"}"#).unwrap();
        assert_eq!(tree.lookup("flag"), Resolution::Found(Resolved::Scalar("on")));
    }

    #[test]
    fn rejects_non_mapping_root() {
        let err = SecretTree::from_yaml_str("- a\n- b\n").unwrap_err();
        assert!(matches!(err, TreeError::RootNotMapping { ref found } if found == "sequence"));

        let err = SecretTree::from_yaml_str("just a string").unwrap_err();
        assert!(matches!(err, TreeError::RootNotMapping { ref found } if found == "string"));

        let err = SecretTree::from_json_slice(b"42").unwrap_err();
        assert!(matches!(err, TreeError::RootNotMapping { .. }));
    }

    #[test]
    fn null_document_is_not_a_mapping() {
        let err = SecretTree::from_yaml_str("~").unwrap_err();
        assert!(matches!(err, TreeError::RootNotMapping { ref found } if found == "null"));
    }

    #[test]
    fn rejects_unparseable_documents() {
        assert!(matches!(
            SecretTree::from_yaml_str("db: [unclosed").unwrap_err(),
            TreeError::Yaml(_)
        ));
        assert!(matches!(
            SecretTree::from_json_slice(b"{not json").unwrap_err(),
            TreeError::Json(_)
        ));
    }

    #[test]
    fn empty_mapping_is_a_valid_tree() {
        let tree = SecretTree::from_yaml_str("{}").unwrap();
        assert!(tree.is_empty());
        assert_eq!(
            tree.lookup(""),
            Resolution::Found(Resolved::Subtree(tree.root()))
        );
    }
}
