//! ObjectReader - synchronous, single-pass `Read` over an object's bytes

use crate::CloudError;
use bytes::{Buf, Bytes};
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::fmt;
use std::io::Read;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::trace;

/// Streams an object body chunk by chunk.
///
/// Only the chunk currently being consumed is held in memory. Dropping the
/// reader drops the body stream, which releases the underlying connection.
pub struct ObjectReader {
    runtime: Arc<Runtime>,
    stream: BoxStream<'static, object_store::Result<Bytes>>,
    chunk: Bytes,
    bytes_read: u64,
    done: bool,
}

impl ObjectReader {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        stream: BoxStream<'static, object_store::Result<Bytes>>,
    ) -> Self {
        Self {
            runtime,
            stream,
            chunk: Bytes::new(),
            bytes_read: 0,
            done: false,
        }
    }

    /// Pull chunks until one with data arrives or the stream ends
    fn refill(&mut self) -> std::io::Result<()> {
        while self.chunk.is_empty() && !self.done {
            match self.runtime.block_on(self.stream.next()) {
                Some(Ok(chunk)) => {
                    trace!("Received chunk of {} bytes", chunk.len());
                    self.chunk = chunk;
                }
                Some(Err(e)) => return Err(CloudError::ObjectStore(e).into()),
                None => self.done = true,
            }
        }
        Ok(())
    }
}

impl Read for ObjectReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        self.refill()?;

        let n = buf.len().min(self.chunk.len());
        buf[..n].copy_from_slice(&self.chunk[..n]);
        self.chunk.advance(n);
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectReader")
            .field("bytes_read", &self.bytes_read)
            .field("buffered", &self.chunk.len())
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::shared_runtime;
    use futures_util::stream;

    fn reader_over(chunks: Vec<object_store::Result<Bytes>>) -> ObjectReader {
        ObjectReader::new(shared_runtime().unwrap(), stream::iter(chunks).boxed())
    }

    #[test]
    fn test_reads_across_chunks() {
        let mut reader = reader_over(vec![
            Ok(Bytes::from_static(b"hel")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"lo")),
        ]);

        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert!(format!("{reader:?}").contains("bytes_read: 5"));
    }

    #[test]
    fn test_small_buffer_reads() {
        let mut reader = reader_over(vec![Ok(Bytes::from_static(b"abcdef"))]);
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_stream_error_surfaces_as_io_error() {
        let mut reader = reader_over(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(object_store::Error::Generic {
                store: "test",
                source: "connection reset".into(),
            }),
        ]);

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert!(matches!(
            CloudError::from_io(err),
            CloudError::ObjectStore(_)
        ));
    }
}
