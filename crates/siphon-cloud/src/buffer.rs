//! Part buffer for uploads

use bytes::{Bytes, BytesMut};

/// Accumulates written bytes until a full upload part is ready
#[derive(Debug)]
pub(crate) struct PartBuffer {
    buffer: BytesMut,
    capacity: usize,
}

impl PartBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// Copy as much of `data` as fits, returning the number of bytes taken
    pub fn fill(&mut self, data: &[u8]) -> usize {
        let room = self.capacity - self.buffer.len();
        let n = data.len().min(room);
        self.buffer.extend_from_slice(&data[..n]);
        n
    }

    /// Take the buffered bytes, leaving the buffer empty
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }
}
