//! Pool path parsing
//!
//! Pool paths have the shape `/<container>/<key/with/slashes>`. Nothing here
//! validates segment contents; the backend decides what is legal.

use std::fmt;

/// A pool path split into its container and in-container key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPath {
    /// Segment after the leading `/`, empty for the pool root
    pub container: String,
    /// Everything after the container segment, empty for a container root
    pub key: String,
}

impl ParsedPath {
    /// Split `path` into container and key. Never fails.
    ///
    /// Only one leading `/` is dropped, so `//key` has an empty container.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let (container, key) = match trimmed.split_once('/') {
            Some((container, key)) => (container, key),
            None => (trimmed, ""),
        };

        Self {
            container: container.to_string(),
            key: key.to_string(),
        }
    }

    /// The path names the pool root (no container)
    pub fn is_root(&self) -> bool {
        self.container.is_empty()
    }

    /// The path names a container itself, not anything inside it
    pub fn is_container(&self) -> bool {
        !self.container.is_empty() && self.key.is_empty()
    }
}

impl fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.container.is_empty(), self.key.is_empty()) {
            (true, _) => write!(f, "/"),
            (false, true) => write!(f, "/{}", self.container),
            (false, false) => write!(f, "/{}/{}", self.container, self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container_and_key() {
        let parsed = ParsedPath::parse("/bucket1/a.txt");
        assert_eq!(parsed.container, "bucket1");
        assert_eq!(parsed.key, "a.txt");

        let parsed = ParsedPath::parse("/upload-testing/siphontest/destput/src.txt");
        assert_eq!(parsed.container, "upload-testing");
        assert_eq!(parsed.key, "siphontest/destput/src.txt");
    }

    #[test]
    fn test_parse_root() {
        for root in ["", "/", "//"] {
            let parsed = ParsedPath::parse(root);
            assert!(parsed.is_root(), "{root:?} should be the root");
            assert!(parsed.key.is_empty());
        }
    }

    #[test]
    fn test_parse_container_root() {
        for path in ["/bucket1", "/bucket1/", "bucket1"] {
            let parsed = ParsedPath::parse(path);
            assert_eq!(parsed.container, "bucket1");
            assert!(parsed.is_container(), "{path:?} should be a container root");
        }
    }

    #[test]
    fn test_parse_without_leading_slash() {
        let parsed = ParsedPath::parse("bucket/dir/file");
        assert_eq!(parsed.container, "bucket");
        assert_eq!(parsed.key, "dir/file");
    }

    #[test]
    fn test_parse_empty_container_segment() {
        let parsed = ParsedPath::parse("//dir/a.txt");
        assert!(parsed.is_root());
        assert_eq!(parsed.key, "dir/a.txt");

        let parsed = ParsedPath::parse("//a.txt");
        assert_eq!(parsed.container, "");
        assert_eq!(parsed.key, "a.txt");
    }

    #[test]
    fn test_parse_passes_odd_keys_through() {
        let parsed = ParsedPath::parse("/bucket/dir//file/");
        assert_eq!(parsed.key, "dir//file/");
    }

    #[test]
    fn test_parse_recovers_segments() {
        for (container, key) in [("b", "k"), ("my-bucket", "file.tar.gz"), ("x", "")] {
            let parsed = ParsedPath::parse(&format!("/{container}/{key}"));
            assert_eq!(parsed.container, container);
            assert_eq!(parsed.key, key);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ParsedPath::parse("/").to_string(), "/");
        assert_eq!(ParsedPath::parse("/b").to_string(), "/b");
        assert_eq!(ParsedPath::parse("/b/k/x").to_string(), "/b/k/x");
    }
}
