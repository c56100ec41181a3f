//! The file pool abstraction

use crate::{FileEntry, ParsedPath, Result};
use std::io::Read;

/// Something that can hand out and accept whole files by path
pub trait Siphonable {
    /// Open a single-pass stream over the file at `path`.
    ///
    /// Dropping the returned reader releases whatever connection backs it.
    fn get(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Store everything `src` yields at `path`
    fn put(&self, path: &str, src: &mut dyn Read) -> Result<()>;
}

/// Filesystem-like verbs over one storage backend
pub trait FilePool: Siphonable {
    /// Backend identifier, e.g. `"s3"`
    fn info(&self) -> &str;

    /// Split a pool path into container and key
    fn parse_path(&self, path: &str) -> ParsedPath {
        ParsedPath::parse(path)
    }

    /// List containers at the root, otherwise the entries directly under `path`.
    ///
    /// A path naming a single object with nothing beneath it lists that object.
    fn ls(&self, path: &str) -> Result<Vec<FileEntry>>;

    /// Create a container, or a zero-byte marker object inside one
    fn mkdir(&self, path: &str) -> Result<()>;

    /// Delete everything at and under `path`; a bare container is deleted too.
    ///
    /// Stops at the first failed delete without undoing earlier ones.
    fn rm(&self, path: &str) -> Result<()>;

    /// Copy one object
    fn cp(&self, src: &str, dest: &str) -> Result<()>;

    /// Copy then remove the source; a failed copy leaves the source untouched
    fn mv(&self, src: &str, dest: &str) -> Result<()> {
        self.cp(src, dest)?;
        self.rm(src)
    }
}
