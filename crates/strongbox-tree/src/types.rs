//! Core types for the secret tree.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, Serializer};

/// A named group of secrets.
///
/// Keys are kept sorted so that serialising a subtree is deterministic.
pub type Subtree = BTreeMap<String, SecretNode>;

/// A node in the secret tree.
///
/// Well-formed documents contain only scalars and subtrees. Anything else in
/// the source document is kept as [`SecretNode::Invalid`] together with its
/// original value. A lookup that lands on such a node reports it as malformed,
/// while an enclosing subtree serialises it verbatim.
#[derive(Clone, PartialEq, Eq)]
pub enum SecretNode {
    /// A leaf secret value.
    Scalar(String),

    /// A named group of further nodes.
    Subtree(Subtree),

    /// A value of a shape the tree does not support.
    Invalid(InvalidKind, RawValue),
}

/// The shape of an unsupported value found in a secrets document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidKind {
    /// An explicit null, or a key with no value.
    Null,
    /// An unquoted `true`/`false`.
    Bool,
    /// An integer or floating point number.
    Number,
    /// A list of values.
    Sequence,
    /// A mapping with at least one key that is not a string.
    NonStringKey,
    /// A YAML value carrying an explicit tag.
    Tagged,
}

impl fmt::Display for InvalidKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::Sequence => "sequence",
            Self::NonStringKey => "mapping with non-string keys",
            Self::Tagged => "tagged value",
        };
        f.write_str(name)
    }
}

/// An unsupported value exactly as the source document held it.
#[derive(Clone, PartialEq, Eq)]
pub enum RawValue {
    Yaml(serde_yaml::Value),
    Json(serde_json::Value),
}

impl fmt::Debug for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Yaml(value) => value.serialize(serializer),
            Self::Json(value) => value.serialize(serializer),
        }
    }
}

impl SecretNode {
    /// Creates a scalar node.
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Creates a subtree node from `(name, node)` pairs.
    pub fn subtree<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SecretNode)>,
    {
        Self::Subtree(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the scalar value, if this node is one.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the child mapping, if this node is a subtree.
    #[must_use]
    pub const fn as_subtree(&self) -> Option<&Subtree> {
        match self {
            Self::Subtree(children) => Some(children),
            _ => None,
        }
    }

    /// Returns the kind of unsupported value, if this node is one.
    #[must_use]
    pub const fn invalid_kind(&self) -> Option<InvalidKind> {
        match self {
            Self::Invalid(kind, _) => Some(*kind),
            _ => None,
        }
    }

    /// Returns true if neither this node nor any descendant is invalid.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Scalar(_) => true,
            Self::Subtree(children) => children.values().all(Self::is_well_formed),
            Self::Invalid(..) => false,
        }
    }
}

impl fmt::Debug for SecretNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(_) => f.write_str("[REDACTED]"),
            Self::Subtree(children) => f.debug_map().entries(children.iter()).finish(),
            Self::Invalid(kind, _) => write!(f, "Invalid({kind})"),
        }
    }
}

impl Serialize for SecretNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(value) => serializer.serialize_str(value),
            Self::Subtree(children) => serializer.collect_map(children),
            Self::Invalid(_, raw) => raw.serialize(serializer),
        }
    }
}

impl From<serde_yaml::Value> for SecretNode {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::String(s) => Self::Scalar(s),
            Value::Mapping(mapping) if mapping.iter().all(|(key, _)| key.is_string()) => {
                let mut children = Subtree::new();
                for (key, child) in mapping {
                    if let Value::String(key) = key {
                        children.insert(key, Self::from(child));
                    }
                }
                Self::Subtree(children)
            }
            Value::Mapping(mapping) => Self::Invalid(
                InvalidKind::NonStringKey,
                RawValue::Yaml(Value::Mapping(mapping)),
            ),
            other => {
                let kind = match &other {
                    Value::Null => InvalidKind::Null,
                    Value::Bool(_) => InvalidKind::Bool,
                    Value::Number(_) => InvalidKind::Number,
                    Value::Sequence(_) => InvalidKind::Sequence,
                    _ => InvalidKind::Tagged,
                };
                Self::Invalid(kind, RawValue::Yaml(other))
            }
        }
    }
}

impl From<serde_json::Value> for SecretNode {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::String(s) => Self::Scalar(s),
            Value::Object(object) => Self::Subtree(
                object
                    .into_iter()
                    .map(|(key, child)| (key, Self::from(child)))
                    .collect(),
            ),
            other => {
                let kind = match &other {
                    Value::Bool(_) => InvalidKind::Bool,
                    Value::Number(_) => InvalidKind::Number,
                    Value::Array(_) => InvalidKind::Sequence,
                    _ => InvalidKind::Null,
                };
                Self::Invalid(kind, RawValue::Json(other))
            }
        }
    }
}
