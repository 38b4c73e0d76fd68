//! Path resolution against the secret tree.

use crate::path::SecretPath;
use crate::types::{SecretNode, Subtree};

/// A value found at the end of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// A leaf secret.
    Scalar(&'a str),
    /// A group of secrets.
    Subtree(&'a Subtree),
}

/// The outcome of walking a path through the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The path names an existing scalar or subtree.
    Found(Resolved<'a>),

    /// Some segment is absent, empty, or tries to descend into a scalar.
    NotFound,

    /// The walk reached a node that is neither a scalar nor a subtree.
    Malformed {
        /// Index of the segment whose value was malformed.
        depth: usize,
    },
}

impl Resolution<'_> {
    /// Returns true if the path named an existing secret.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Walks `path` from `root`.
///
/// Stops at the first missing segment, at the first scalar that still has
/// segments after it, or at the first invalid node. The empty path resolves
/// to `root` itself.
#[must_use]
pub fn resolve<'a>(root: &'a Subtree, path: &SecretPath) -> Resolution<'a> {
    let segments = path.segments();
    let mut current = root;

    for (depth, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Resolution::NotFound;
        }

        let Some(child) = current.get(segment) else {
            return Resolution::NotFound;
        };

        let is_last = depth + 1 == segments.len();

        match child {
            SecretNode::Scalar(value) if is_last => {
                return Resolution::Found(Resolved::Scalar(value));
            }
            SecretNode::Scalar(_) => return Resolution::NotFound,
            SecretNode::Subtree(children) => current = children,
            SecretNode::Invalid(..) => return Resolution::Malformed { depth },
        }
    }

    Resolution::Found(Resolved::Subtree(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tree() -> Subtree {
        let SecretNode::Subtree(root) = SecretNode::subtree([
            (
                "db",
                SecretNode::subtree([
                    ("user", SecretNode::scalar("alice")),
                    ("pass", SecretNode::scalar("hunter2")),
                ]),
            ),
            ("flag", SecretNode::scalar("on")),
            ("port", SecretNode::from(serde_json::json!(5432))),
            (
                "nested",
                SecretNode::subtree([(
                    "deep",
                    SecretNode::subtree([("leaf", SecretNode::scalar("value"))]),
                )]),
            ),
            ("", SecretNode::scalar("empty key")),
        ]) else {
            unreachable!()
        };
        root
    }

    fn at<'a>(root: &'a Subtree, raw: &str) -> Resolution<'a> {
        resolve(root, &SecretPath::parse(raw))
    }

    #[rstest]
    fn empty_path_resolves_to_whole_tree(tree: Subtree) {
        assert_eq!(at(&tree, ""), Resolution::Found(Resolved::Subtree(&tree)));
        assert_eq!(at(&tree, "/"), Resolution::Found(Resolved::Subtree(&tree)));
    }

    #[rstest]
    #[case("flag", "on")]
    #[case("db/user", "alice")]
    #[case("/db/pass/", "hunter2")]
    #[case("nested/deep/leaf", "value")]
    fn scalar_chain_resolves(tree: Subtree, #[case] raw: &str, #[case] expected: &str) {
        assert_eq!(at(&tree, raw), Resolution::Found(Resolved::Scalar(expected)));
    }

    #[rstest]
    fn subtree_resolves(tree: Subtree) {
        let Resolution::Found(Resolved::Subtree(db)) = at(&tree, "db") else {
            panic!("expected subtree");
        };
        assert_eq!(db.len(), 2);
        assert_eq!(db["user"].as_scalar(), Some("alice"));
    }

    #[rstest]
    #[case("flag/x")]
    #[case("db/user/extra")]
    #[case("nested/deep/leaf/more/segments")]
    fn descending_into_scalar_is_not_found(tree: Subtree, #[case] raw: &str) {
        assert_eq!(at(&tree, raw), Resolution::NotFound);
    }

    #[rstest]
    #[case("missing")]
    #[case("missing/port")]
    #[case("db/missing")]
    #[case("DB/user")]
    #[case("db/user/missing/deeper")]
    fn absent_segment_is_not_found(tree: Subtree, #[case] raw: &str) {
        assert_eq!(at(&tree, raw), Resolution::NotFound);
    }

    #[rstest]
    #[case("db//user")]
    #[case("//db")]
    #[case("db//")]
    fn empty_segments_never_match(tree: Subtree, #[case] raw: &str) {
        assert_eq!(at(&tree, raw), Resolution::NotFound);
    }

    #[rstest]
    fn invalid_node_is_malformed(tree: Subtree) {
        assert_eq!(at(&tree, "port"), Resolution::Malformed { depth: 0 });
        assert_eq!(at(&tree, "port/anything"), Resolution::Malformed { depth: 0 });
    }

    #[rstest]
    fn subtree_holding_invalid_node_still_resolves(tree: Subtree) {
        let Resolution::Found(Resolved::Subtree(root)) = at(&tree, "") else {
            panic!("expected subtree");
        };
        assert_eq!(root["port"].invalid_kind(), Some(crate::InvalidKind::Number));
    }

    #[test]
    fn malformed_depth_points_at_offending_segment() {
        let SecretNode::Subtree(root) = SecretNode::subtree([(
            "a",
            SecretNode::subtree([("b", SecretNode::from(serde_json::json!(["x", "y"])))]),
        )]) else {
            unreachable!()
        };

        assert_eq!(at(&root, "a/b/c"), Resolution::Malformed { depth: 1 });
        assert!(at(&root, "a").is_found());
    }

    #[test]
    fn missing_segment_stops_before_malformed_sibling() {
        let SecretNode::Subtree(root) = SecretNode::subtree([
            ("bad", SecretNode::from(serde_json::Value::Null)),
            ("good", SecretNode::scalar("yes")),
        ]) else {
            unreachable!()
        };

        assert_eq!(at(&root, "other/bad"), Resolution::NotFound);
        assert_eq!(at(&root, "good"), Resolution::Found(Resolved::Scalar("yes")));
    }
}
