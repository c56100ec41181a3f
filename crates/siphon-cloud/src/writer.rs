//! ObjectWriter - provides synchronous Write for cloud objects

use crate::buffer::PartBuffer;
use crate::{CloudError, Result};
use object_store::path::Path as ObjectPath;
use object_store::{MultipartUpload, ObjectStore};
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, trace, warn};

/// Uploads everything written to it as one object.
///
/// Objects smaller than one part go up in a single PUT when the writer is
/// finalized. Once a full part has been buffered the writer switches to a
/// multipart upload and sends each part as it fills. Nothing becomes visible
/// until `finalize` succeeds; dropping an unfinalized writer aborts the upload.
pub struct ObjectWriter {
    runtime: Arc<Runtime>,
    store: Arc<dyn ObjectStore>,
    path: ObjectPath,
    buffer: PartBuffer,
    bytes_written: u64,
    parts: usize,
    multipart: Option<Box<dyn MultipartUpload>>,
}

impl ObjectWriter {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        store: Arc<dyn ObjectStore>,
        path: ObjectPath,
        part_size: usize,
    ) -> Self {
        Self {
            runtime,
            store,
            path,
            buffer: PartBuffer::new(part_size),
            bytes_written: 0,
            parts: 0,
            multipart: None,
        }
    }

    /// Get the total number of bytes written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Send the buffered part, starting a multipart upload if needed
    fn upload_part(&mut self) -> Result<()> {
        if self.multipart.is_none() {
            debug!("Starting multipart upload for {}", self.path);
            let upload = self
                .runtime
                .block_on(self.store.put_multipart(&self.path))?;
            self.multipart = Some(upload);
        }

        let data = self.buffer.take();
        if let Some(upload) = self.multipart.as_mut() {
            trace!("Uploading part {} of {} bytes", self.parts + 1, data.len());
            self.runtime.block_on(upload.put_part(data.into()))?;
            self.parts += 1;
        }
        Ok(())
    }

    /// Commit the object.
    ///
    /// Must be called for the data to land; errors are reported here rather
    /// than swallowed on drop.
    pub fn finalize(mut self) -> Result<()> {
        match self.multipart.take() {
            Some(mut upload) => {
                if !self.buffer.is_empty() {
                    let data = self.buffer.take();
                    self.runtime.block_on(upload.put_part(data.into()))?;
                    self.parts += 1;
                }
                debug!(
                    "Completing multipart upload of {} parts for {}",
                    self.parts, self.path
                );
                if let Err(e) = self.runtime.block_on(upload.complete()) {
                    let _ = self.runtime.block_on(upload.abort());
                    return Err(CloudError::ObjectStore(e));
                }
            }
            None => {
                let data = self.buffer.take();
                debug!("Uploading {} bytes to {}", data.len(), self.path);
                self.runtime
                    .block_on(self.store.put(&self.path, data.into()))?;
            }
        }
        Ok(())
    }
}

impl Write for ObjectWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut remaining = buf;
        while !remaining.is_empty() {
            let n = self.buffer.fill(remaining);
            remaining = &remaining[n..];
            self.bytes_written += n as u64;

            if self.buffer.is_full() {
                self.upload_part()?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // Parts only leave on a full buffer or finalize
        Ok(())
    }
}

impl Drop for ObjectWriter {
    fn drop(&mut self) {
        if let Some(mut upload) = self.multipart.take() {
            warn!("Aborting unfinished multipart upload for {}", self.path);
            if let Err(e) = self.runtime.block_on(upload.abort()) {
                warn!("Failed to abort multipart upload for {}: {}", self.path, e);
            }
        }
    }
}

impl fmt::Debug for ObjectWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectWriter")
            .field("path", &self.path)
            .field("bytes_written", &self.bytes_written)
            .field("buffered", &self.buffer.len())
            .field("parts", &self.parts)
            .finish()
    }
}
