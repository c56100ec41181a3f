//! # siphon-cloud
//!
//! Object storage file pool for file-siphon. `ObjectPool` implements the
//! `FilePool` verbs from `siphon-core` on top of the `object_store` crate, so
//! callers get plain blocking calls and `std::io` streams instead of futures.
//!
//! ## Architecture
//!
//! - `Backend`: container-level calls (list/create/delete buckets) and a
//!   per-container `ObjectStore`. `S3Backend` talks to S3; `MemoryBackend`
//!   keeps everything in process.
//! - `ObjectReader`: implements `std::io::Read` over an object body, one chunk
//!   at a time
//! - `ObjectWriter`: implements `std::io::Write`, switching to a multipart
//!   upload once a full part is buffered
//!
//! All of these block on one shared Tokio runtime. Do not call them from inside
//! another Tokio runtime.

#![warn(missing_debug_implementations)]

pub mod backend;
mod buffer;
mod error;
mod pool;
mod reader;
mod runtime;
mod writer;

pub use backend::{Backend, ContainerMeta, MemoryBackend, S3Backend};
pub use error::{CloudError, Result};
pub use pool::{ObjectPool, DEFAULT_PART_SIZE, MIN_S3_PART_SIZE};
pub use reader::ObjectReader;
pub use writer::ObjectWriter;

// Re-export commonly used types from object_store
pub use object_store::{path::Path as ObjectPath, ObjectStore};
