//! Slash-delimited secret paths.

use std::fmt;

/// An address into the secret tree.
///
/// Parsing strips a single leading and a single trailing slash and splits the
/// remainder on `/`. Every other slash is significant, so `a//b` contains an
/// empty segment, which never matches a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SecretPath {
    segments: Vec<String>,
}

impl SecretPath {
    /// The root path, addressing the whole tree.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parses a raw slash-delimited path.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.strip_prefix('/').unwrap_or(raw);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        if trimmed.is_empty() {
            return Self::root();
        }

        Self {
            segments: trimmed.split('/').map(str::to_owned).collect(),
        }
    }

    /// Returns the path segments in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns true if this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

impl From<&str> for SecretPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}
