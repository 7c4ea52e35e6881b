//! Typed index tree and virtual path resolution.
//!
//! The JSON index document is parsed once, at archive open, into a tree of
//! [`Node`] values. Resolution then works on typed nodes instead of probing
//! an untyped document for field presence at every query.

use std::collections::HashMap;
use std::path::is_separator;

use serde::{Deserialize, Deserializer};

use crate::error::{AsarError, Result};
use crate::integrity::IntegrityPayload;

/// Upper bound on symlink indirection while resolving a path. A cyclic index
/// resolves as absent instead of recursing forever.
pub(crate) const MAX_LINK_DEPTH: usize = 64;

/// One entry in the index tree.
///
/// A node carrying a `link` key is a symlink even if other keys are present,
/// matching how the format is resolved in practice; variant order encodes
/// that precedence.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Link {
        link: String,
    },
    Directory {
        files: HashMap<String, Node>,
    },
    File {
        size: u64,
        #[serde(default, deserialize_with = "offset_from_decimal")]
        offset: Option<u64>,
        #[serde(default)]
        unpacked: bool,
        #[serde(default)]
        executable: bool,
        #[serde(default)]
        integrity: Option<IntegrityPayload>,
    },
}

/// File offsets are stored as decimal strings in the JSON document (they can
/// exceed the range JavaScript numbers represent exactly).
fn offset_from_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|s| s.parse::<u64>().map_err(serde::de::Error::custom))
        .transpose()
}

/// Node type tag reported by [`Stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Link,
}

/// Metadata of a single packed or unpacked file.
///
/// `offset` is absolute within the container (the header size is already
/// added). For unpacked files `offset` is zero and the executable flag is
/// not reported; the file lives on disk and carries its own metadata.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub size: u64,
    pub offset: u64,
    pub unpacked: bool,
    pub executable: bool,
    pub integrity: Option<IntegrityPayload>,
}

impl FileInfo {
    /// Populate file metadata from a resolved node.
    pub(crate) fn from_node(node: &Node, header_size: u32, path: &str) -> Result<Self> {
        match node {
            Node::File {
                size,
                offset,
                unpacked,
                executable,
                integrity,
            } => {
                if *unpacked {
                    return Ok(FileInfo {
                        size: *size,
                        offset: 0,
                        unpacked: true,
                        executable: false,
                        integrity: None,
                    });
                }
                let offset = offset.ok_or_else(|| AsarError::MissingOffset(path.to_string()))?;
                Ok(FileInfo {
                    size: *size,
                    offset: offset + u64::from(header_size),
                    unpacked: false,
                    executable: *executable,
                    integrity: integrity.clone(),
                })
            }
            Node::Directory { .. } | Node::Link { .. } => {
                Err(AsarError::NotAFile(path.to_string()))
            }
        }
    }
}

/// Result of a `stat` query: the node's type, plus full file metadata when
/// the node is a file.
#[derive(Debug, Clone)]
pub enum Stats {
    File(FileInfo),
    Directory,
    Link,
}

impl Stats {
    pub fn file_type(&self) -> FileType {
        match self {
            Stats::File(_) => FileType::File,
            Stats::Directory => FileType::Directory,
            Stats::Link => FileType::Link,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Stats::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Stats::Directory)
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Stats::Link)
    }

    pub fn info(&self) -> Option<&FileInfo> {
        match self {
            Stats::File(info) => Some(info),
            _ => None,
        }
    }
}

/// The decoded index tree of one container.
#[derive(Debug)]
pub struct ContainerIndex {
    root: Node,
}

impl ContainerIndex {
    pub(crate) fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Resolve `path` against the tree. Segments are split on the platform's
    /// path separators; an empty path resolves to the root. Intermediate
    /// symlinked directories are followed; the final node is returned as-is.
    pub fn node_at(&self, path: &str) -> Option<&Node> {
        self.node_at_depth(path, 0)
    }

    fn node_at_depth(&self, path: &str, depth: usize) -> Option<&Node> {
        if path.is_empty() {
            return Some(&self.root);
        }

        let mut dir = &self.root;
        let mut rest = path;
        while let Some(pos) = rest.find(is_separator) {
            dir = self.child_at_depth(&rest[..pos], dir, depth)?;
            rest = &rest[pos + 1..];
        }
        self.child_at_depth(rest, dir, depth)
    }

    /// Child listing of `node`, following one level of symlink indirection.
    /// A symlink's target is resolved from the archive root, never relative
    /// to the link itself, and must be a directory.
    pub fn files_of<'a>(&'a self, node: &'a Node) -> Option<&'a HashMap<String, Node>> {
        self.files_of_depth(node, 0)
    }

    fn files_of_depth<'a>(
        &'a self,
        node: &'a Node,
        depth: usize,
    ) -> Option<&'a HashMap<String, Node>> {
        match node {
            Node::Link { link } => {
                if depth >= MAX_LINK_DEPTH {
                    return None;
                }
                match self.node_at_depth(link, depth + 1)? {
                    Node::Directory { files } => Some(files),
                    _ => None,
                }
            }
            Node::Directory { files } => Some(files),
            Node::File { .. } => None,
        }
    }

    fn child_at_depth<'a>(&'a self, name: &str, dir: &'a Node, depth: usize) -> Option<&'a Node> {
        // An empty segment ("a//b", a leading separator) restarts at the root.
        if name.is_empty() {
            return Some(&self.root);
        }
        self.files_of_depth(dir, depth)?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(doc: &str) -> ContainerIndex {
        ContainerIndex::new(serde_json::from_str(doc).unwrap())
    }

    #[test]
    fn resolves_nested_paths() {
        let idx = index(
            r#"{"files": {"dir": {"files": {"f.txt": {"size": 3, "offset": "0"}}}}}"#,
        );
        assert!(matches!(idx.node_at(""), Some(Node::Directory { .. })));
        assert!(matches!(idx.node_at("dir"), Some(Node::Directory { .. })));
        assert!(matches!(idx.node_at("dir/f.txt"), Some(Node::File { .. })));
        assert!(idx.node_at("dir/missing").is_none());
        assert!(idx.node_at("f.txt/impossible").is_none());
    }

    #[test]
    fn follows_linked_directories() {
        let idx = index(
            r#"{"files": {
                "real": {"files": {"f.txt": {"size": 1, "offset": "0"}}},
                "alias": {"link": "real"}
            }}"#,
        );
        assert!(matches!(idx.node_at("alias/f.txt"), Some(Node::File { .. })));
    }

    #[test]
    fn link_targets_resolve_from_root() {
        let idx = index(
            r#"{"files": {
                "a": {"files": {"b": {"files": {"f": {"size": 1, "offset": "0"}}}}},
                "deep": {"files": {"alias": {"link": "a/b"}}}
            }}"#,
        );
        assert!(matches!(
            idx.node_at("deep/alias/f"),
            Some(Node::File { .. })
        ));
    }

    #[test]
    fn cyclic_links_resolve_as_absent() {
        let idx = index(
            r#"{"files": {
                "a": {"link": "b"},
                "b": {"link": "a"}
            }}"#,
        );
        assert!(idx.node_at("a/anything").is_none());
    }

    #[test]
    fn link_precedence_over_other_keys() {
        let doc = r#"{"link": "target", "size": 4}"#;
        let node: Node = serde_json::from_str(doc).unwrap();
        assert!(matches!(node, Node::Link { .. }));
    }

    #[test]
    fn malformed_offset_fails_parse() {
        let doc = r#"{"size": 4, "offset": "not-a-number"}"#;
        assert!(serde_json::from_str::<Node>(doc).is_err());
    }

    #[test]
    fn file_info_requires_offset_for_packed() {
        let node: Node = serde_json::from_str(r#"{"size": 4}"#).unwrap();
        let err = FileInfo::from_node(&node, 16, "f").unwrap_err();
        assert!(matches!(err, AsarError::MissingOffset(_)));
    }

    #[test]
    fn file_info_adds_header_size() {
        let node: Node = serde_json::from_str(r#"{"size": 4, "offset": "100"}"#).unwrap();
        let info = FileInfo::from_node(&node, 16, "f").unwrap();
        assert_eq!(info.offset, 116);
        assert_eq!(info.size, 4);
    }

    #[test]
    fn unpacked_file_short_circuits() {
        let node: Node =
            serde_json::from_str(r#"{"size": 4, "unpacked": true, "executable": true}"#).unwrap();
        let info = FileInfo::from_node(&node, 16, "f").unwrap();
        assert!(info.unpacked);
        assert_eq!(info.offset, 0);
        assert!(!info.executable);
    }
}
