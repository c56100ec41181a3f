//! Default `FilePool` behavior checked against a map-backed pool

use siphon_core::{siphon_file, Error, FileEntry, FilePool, ParsedPath, Result, Siphonable};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};

#[derive(Default)]
struct MapPool {
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    calls: RefCell<Vec<String>>,
}

impl MapPool {
    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Siphonable for MapPool {
    fn get(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        self.record(format!("get {path}"));
        let data = self.files.borrow().get(path).cloned().ok_or_else(|| {
            Error::backend(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
        })?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn put(&self, path: &str, src: &mut dyn Read) -> Result<()> {
        self.record(format!("put {path}"));
        if self.parse_path(path).container.is_empty() {
            return Err(Error::InvalidPath(path.to_string()));
        }
        let mut data = Vec::new();
        src.read_to_end(&mut data)?;
        self.files.borrow_mut().insert(path.to_string(), data);
        Ok(())
    }
}

impl FilePool for MapPool {
    fn info(&self) -> &str {
        "map"
    }

    fn ls(&self, path: &str) -> Result<Vec<FileEntry>> {
        let prefix = format!("{}/", path.trim_end_matches('/'));
        Ok(self
            .files
            .borrow()
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .map(|name| FileEntry::file(name, 0, v.len() as i64))
            })
            .collect())
    }

    fn mkdir(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn rm(&self, path: &str) -> Result<()> {
        self.record(format!("rm {path}"));
        self.files.borrow_mut().remove(path);
        Ok(())
    }

    fn cp(&self, src: &str, dest: &str) -> Result<()> {
        self.record(format!("cp {src} {dest}"));
        if src.is_empty() {
            return Err(Error::InvalidPath("empty source".to_string()));
        }
        let data = self.files.borrow().get(src).cloned().ok_or_else(|| {
            Error::backend(std::io::Error::new(std::io::ErrorKind::NotFound, src.to_string()))
        })?;
        self.files.borrow_mut().insert(dest.to_string(), data);
        Ok(())
    }
}

#[test]
fn test_default_parse_path() {
    let pool = MapPool::default();
    assert_eq!(
        pool.parse_path("/bucket/dir/file"),
        ParsedPath {
            container: "bucket".to_string(),
            key: "dir/file".to_string(),
        }
    );
}

#[test]
fn test_mv_is_cp_then_rm() {
    let pool = MapPool::default();
    pool.put("/b/a", &mut Cursor::new(b"data".to_vec())).unwrap();

    pool.mv("/b/a", "/b/c").unwrap();

    assert_eq!(
        *pool.calls.borrow(),
        ["put /b/a", "cp /b/a /b/c", "rm /b/a"]
    );
    assert!(pool.get("/b/a").is_err());
    assert_eq!(pool.ls("/b").unwrap()[0].name, "c");
}

#[test]
fn test_mv_skips_rm_when_cp_fails() {
    let pool = MapPool::default();

    assert!(matches!(pool.mv("/b/missing", "/b/c"), Err(Error::Backend(_))));
    assert!(matches!(pool.mv("", "/b/c"), Err(Error::InvalidPath(_))));
    assert!(!pool.calls.borrow().iter().any(|c| c.starts_with("rm")));
}

#[test]
fn test_siphon_between_map_pools() {
    let src = MapPool::default();
    let dest = MapPool::default();
    src.put("/s/file", &mut Cursor::new(b"payload".to_vec())).unwrap();

    siphon_file(&src, "/s/file", &dest, "/d/file").unwrap();
    assert!(dest.calls.borrow().iter().all(|c| !c.starts_with("get")));

    let mut out = String::new();
    dest.get("/d/file").unwrap().read_to_string(&mut out).unwrap();
    assert_eq!(out, "payload");
}

#[test]
fn test_siphon_into_root_is_invalid() {
    let src = MapPool::default();
    let dest = MapPool::default();
    src.put("/s/file", &mut Cursor::new(b"x".to_vec())).unwrap();

    let err = siphon_file(&src, "/s/file", &dest, "/").unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}
