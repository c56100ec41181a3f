//! Listing records returned by `FilePool::ls`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;

/// Minimal file metadata every listing entry exposes
pub trait FileInfo {
    /// Base name of the entry
    fn name(&self) -> &str;
    /// Size in bytes (zero for directories)
    fn size(&self) -> i64;
    /// Permission bits
    fn mode(&self) -> u32;
    /// Last modification time
    fn mod_time(&self) -> DateTime<Utc>;
    /// Whether the entry is a directory (container or common prefix)
    fn is_dir(&self) -> bool;
    /// Backend-specific payload, if any
    fn sys(&self) -> Option<&dyn Any> {
        None
    }
}

/// Kind of a listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// A stored object
    File,
    /// A container or a common key prefix
    Directory,
}

/// One entry of a pool listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Base name
    pub name: String,
    /// File or directory
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Modification time in microseconds since the epoch
    #[serde(rename = "time", default)]
    pub modified_at_micros: i64,
    /// Size in bytes
    #[serde(rename = "size", default)]
    pub size_bytes: i64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub can_rename: bool,
    #[serde(rename = "can_move_directory", default, skip_serializing_if = "is_false")]
    pub can_move: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub can_delete: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl FileEntry {
    /// A stored object of `size_bytes` bytes
    pub fn file(name: impl Into<String>, modified_at_micros: i64, size_bytes: i64) -> Self {
        Self {
            name: name.into(),
            kind: FileKind::File,
            modified_at_micros,
            size_bytes,
            can_rename: false,
            can_move: false,
            can_delete: false,
        }
    }

    /// A container or common prefix
    pub fn directory(name: impl Into<String>, modified_at_micros: i64) -> Self {
        Self {
            name: name.into(),
            kind: FileKind::Directory,
            modified_at_micros,
            size_bytes: 0,
            can_rename: false,
            can_move: false,
            can_delete: false,
        }
    }
}

impl FileInfo for FileEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> i64 {
        self.size_bytes
    }

    fn mode(&self) -> u32 {
        match self.kind {
            FileKind::Directory => 0o755,
            FileKind::File => 0o644,
        }
    }

    fn mod_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.modified_at_micros).unwrap_or_default()
    }

    fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}
