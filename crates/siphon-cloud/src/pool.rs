//! ObjectPool - the file pool verbs mapped onto object store calls

use crate::backend::{Backend, MemoryBackend, S3Backend};
use crate::runtime::shared_runtime;
use crate::{CloudError, ObjectReader, ObjectWriter, Result};
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use siphon_core::{FileEntry, FilePool, ParsedPath, PoolConfig, Siphonable};
use std::fmt;
use std::future::Future;
use std::io::Read;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Bytes per uploaded part unless `part_size` says otherwise
pub const DEFAULT_PART_SIZE: usize = 8 * 1024 * 1024;

/// Smallest part S3 accepts for all but the last part of a multipart upload
pub const MIN_S3_PART_SIZE: usize = 5 * 1024 * 1024;

/// A file pool over one object storage backend.
///
/// Every call blocks until the backend answers. Nothing is retried or cached,
/// and recursive operations stop at the first failure.
pub struct ObjectPool {
    backend: Arc<dyn Backend>,
    runtime: Arc<Runtime>,
    config: PoolConfig,
    part_size: usize,
}

impl ObjectPool {
    /// Pool over Amazon S3 or an S3-compatible endpoint
    pub fn s3(config: PoolConfig) -> Result<Self> {
        let backend = S3Backend::new(&config)?;
        let mut pool = Self::with_backend(Arc::new(backend), config)?;
        pool.part_size = pool.part_size.max(MIN_S3_PART_SIZE);
        Ok(pool)
    }

    /// Pool over a fresh in-memory backend
    pub fn memory() -> Result<Self> {
        Self::with_backend(Arc::new(MemoryBackend::new()), PoolConfig::default())
    }

    /// Pool over any backend
    pub fn with_backend(backend: Arc<dyn Backend>, config: PoolConfig) -> Result<Self> {
        let part_size = match config.get("part_size") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| CloudError::Config(format!("invalid part_size: {}", raw)))?,
            None => DEFAULT_PART_SIZE,
        };

        Ok(Self {
            backend,
            runtime: shared_runtime()?,
            config,
            part_size,
        })
    }

    /// The configuration this pool was built from
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Bytes buffered per upload part
    pub fn part_size(&self) -> usize {
        self.part_size
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn list(&self, path: &str) -> Result<Vec<FileEntry>> {
        let parsed = ParsedPath::parse(path);

        if parsed.is_root() {
            let containers = self.block_on(self.backend.list_containers())?;
            debug!("Listed {} containers", containers.len());
            return Ok(containers
                .into_iter()
                .map(|c| {
                    let created = c.created.map(|t| t.timestamp_micros()).unwrap_or(0);
                    FileEntry::directory(c.name, created)
                })
                .collect());
        }

        let store = self.backend.container(&parsed.container)?;
        let prefix = key_prefix(&parsed.key)?;
        let listing = self.block_on(store.list_with_delimiter(prefix.as_ref()))?;
        debug!(
            "Listed {}: {} objects, {} prefixes",
            parsed,
            listing.objects.len(),
            listing.common_prefixes.len()
        );

        // Nothing underneath: the key may name a single object
        if listing.objects.is_empty() && listing.common_prefixes.is_empty() {
            if let Some(location) = &prefix {
                return match self.block_on(store.head(location)) {
                    Ok(meta) => Ok(vec![file_entry(&meta)]),
                    Err(object_store::Error::NotFound { .. }) => Ok(Vec::new()),
                    Err(e) => Err(e.into()),
                };
            }
        }

        let dirs: Vec<String> = listing.common_prefixes.iter().map(base_name).collect();
        let mut entries = Vec::with_capacity(listing.objects.len() + dirs.len());
        for meta in &listing.objects {
            // A mkdir marker with children lists once, as the directory
            if dirs.contains(&base_name(&meta.location)) {
                continue;
            }
            entries.push(file_entry(meta));
        }
        entries.extend(dirs.into_iter().map(|name| FileEntry::directory(name, 0)));
        Ok(entries)
    }

    fn open(&self, path: &str) -> Result<ObjectReader> {
        let parsed = ParsedPath::parse(path);
        let store = self.backend.container(&parsed.container)?;
        let location = key_prefix(&parsed.key)?.unwrap_or_default();

        let result = self.block_on(store.get(&location))?;
        debug!("Opened {} ({} bytes)", parsed, result.meta.size);
        Ok(ObjectReader::new(self.runtime.clone(), result.into_stream()))
    }

    fn upload(&self, path: &str, src: &mut dyn Read) -> Result<u64> {
        let parsed = ParsedPath::parse(path);
        let location = object_location(&parsed, path)?;
        let store = self.backend.container(&parsed.container)?;

        let written = self.write_stream(store, location, src)?;
        info!("Stored {} bytes at {}", written, parsed);
        Ok(written)
    }

    fn write_stream(
        &self,
        store: Arc<dyn ObjectStore>,
        location: ObjectPath,
        src: &mut dyn Read,
    ) -> Result<u64> {
        let mut writer = ObjectWriter::new(self.runtime.clone(), store, location, self.part_size);
        // On failure the writer is dropped unfinalized and aborts its upload
        std::io::copy(src, &mut writer).map_err(CloudError::from_io)?;
        let written = writer.bytes_written();
        writer.finalize()?;
        Ok(written)
    }

    fn make_dir(&self, path: &str) -> Result<()> {
        let parsed = ParsedPath::parse(path);

        if parsed.key.is_empty() {
            self.block_on(self.backend.create_container(&parsed.container))?;
            info!("Created container {}", parsed.container);
            return Ok(());
        }

        // A zero-byte object stands in for the directory
        let location = object_location(&parsed, path)?;
        let store = self.backend.container(&parsed.container)?;
        self.block_on(store.put(&location, Bytes::new().into()))?;
        debug!("Created marker object {}", parsed);
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<()> {
        let parsed = ParsedPath::parse(path);
        if parsed.is_root() {
            return Err(CloudError::InvalidPath(format!(
                "cannot remove {:?}: no container",
                path
            )));
        }

        let store = self.backend.container(&parsed.container)?;
        let root = key_prefix(&parsed.key)?;
        let mut deleted = 0usize;

        // Depth-first over common prefixes with an explicit stack
        let mut pending = vec![root.clone()];
        while let Some(prefix) = pending.pop() {
            let listing = self.block_on(store.list_with_delimiter(prefix.as_ref()))?;
            for meta in listing.objects {
                self.block_on(store.delete(&meta.location))?;
                debug!("Deleted {}", meta.location);
                deleted += 1;
            }
            pending.extend(listing.common_prefixes.into_iter().map(Some));
        }

        if let Some(location) = root {
            match self.block_on(store.head(&location)) {
                Ok(_) => {
                    self.block_on(store.delete(&location))?;
                    debug!("Deleted {}", location);
                    deleted += 1;
                }
                Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!("Removed {} objects under {}", deleted, parsed);

        if parsed.is_container() {
            self.block_on(self.backend.delete_container(&parsed.container))?;
            info!("Deleted container {}", parsed.container);
        }
        Ok(())
    }

    fn copy(&self, src: &str, dest: &str) -> Result<()> {
        let from = ParsedPath::parse(src);
        let to = ParsedPath::parse(dest);
        let from_location = object_location(&from, src)?;
        let to_location = object_location(&to, dest)?;

        let src_store = self.backend.container(&from.container)?;
        if from.container == to.container {
            self.block_on(src_store.copy(&from_location, &to_location))?;
            debug!("Copied {} to {} in place", from, to);
            return Ok(());
        }

        // object_store copies only within one bucket; stream across containers
        let dest_store = self.backend.container(&to.container)?;
        let result = self.block_on(src_store.get(&from_location))?;
        let mut reader = ObjectReader::new(self.runtime.clone(), result.into_stream());
        let written = self.write_stream(dest_store, to_location, &mut reader)?;
        debug!("Copied {} to {} ({} bytes streamed)", from, to, written);
        Ok(())
    }
}

impl Siphonable for ObjectPool {
    fn get(&self, path: &str) -> siphon_core::Result<Box<dyn Read + Send>> {
        Ok(Box::new(self.open(path)?))
    }

    fn put(&self, path: &str, src: &mut dyn Read) -> siphon_core::Result<()> {
        self.upload(path, src)?;
        Ok(())
    }
}

impl FilePool for ObjectPool {
    fn info(&self) -> &str {
        self.backend.name()
    }

    fn ls(&self, path: &str) -> siphon_core::Result<Vec<FileEntry>> {
        Ok(self.list(path)?)
    }

    fn mkdir(&self, path: &str) -> siphon_core::Result<()> {
        Ok(self.make_dir(path)?)
    }

    fn rm(&self, path: &str) -> siphon_core::Result<()> {
        Ok(self.remove(path)?)
    }

    fn cp(&self, src: &str, dest: &str) -> siphon_core::Result<()> {
        Ok(self.copy(src, dest)?)
    }
}

impl fmt::Debug for ObjectPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("backend", &self.backend)
            .field("config", &self.config)
            .field("part_size", &self.part_size)
            .finish()
    }
}

/// Store location for a key, taken verbatim and never percent-encoded;
/// `None` means the container root
fn key_prefix(key: &str) -> Result<Option<ObjectPath>> {
    let path = ObjectPath::parse(key)
        .map_err(|e| CloudError::InvalidPath(format!("{:?}: {}", key, e)))?;
    Ok(Some(path).filter(|p| !p.as_ref().is_empty()))
}

/// Location of a single object; the path must name both container and key
fn object_location(parsed: &ParsedPath, raw: &str) -> Result<ObjectPath> {
    if parsed.container.is_empty() {
        return Err(CloudError::InvalidPath(format!("{:?} names no container", raw)));
    }
    key_prefix(&parsed.key)?
        .ok_or_else(|| CloudError::InvalidPath(format!("{:?} names no object", raw)))
}

fn base_name(location: &ObjectPath) -> String {
    location.filename().unwrap_or_default().to_string()
}

fn file_entry(meta: &ObjectMeta) -> FileEntry {
    FileEntry::file(
        base_name(&meta.location),
        meta.last_modified.timestamp_micros(),
        meta.size as i64,
    )
}
