//! Hierarchical secret tree and path resolution for Strongbox.
//!
//! A secrets document is a mapping whose values are either strings or further
//! mappings. This crate turns such a document into an immutable
//! [`SecretTree`] and resolves slash-delimited [`SecretPath`]s against it.
//!
//! # Resolution
//!
//! Walking a path yields a [`Resolution`]:
//!
//! - **Found scalar**: every segment matched and the last one names a string
//! - **Found subtree**: every segment matched and the last one names a mapping
//!   (the empty path names the whole tree)
//! - **Not found**: a segment is missing, empty, or tries to descend into a
//!   string
//! - **Malformed**: the walk reached a value that is neither a string nor a
//!   mapping
//!
//! Unsupported values are kept in the tree as [`SecretNode::Invalid`] and only
//! reported when a lookup reaches them.
//!
//! # Example
//!
//! ```rust
//! use strongbox_tree::{Resolution, Resolved, SecretTree};
//!
//! let tree = SecretTree::from_yaml_str("db:\n  user: alice\nflag: \"on\"\n").unwrap();
//!
//! assert_eq!(tree.lookup("db/user"), Resolution::Found(Resolved::Scalar("alice")));
//! assert_eq!(tree.lookup("flag/x"), Resolution::NotFound);
//! ```

mod error;
mod path;
mod resolve;
mod tree;
mod types;

pub use error::TreeError;
pub use path::SecretPath;
pub use resolve::{resolve, Resolution, Resolved};
pub use tree::SecretTree;
pub use types::{InvalidKind, RawValue, SecretNode, Subtree};
