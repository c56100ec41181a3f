//! Container-level access to an object store provider.
//!
//! `object_store` addresses one bucket at a time and has no notion of listing,
//! creating or deleting buckets. A `Backend` fills that gap and hands out a
//! per-container `ObjectStore` for everything below the container level.

mod memory;
mod s3;

pub use memory::MemoryBackend;
pub use s3::S3Backend;

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use object_store::ObjectStore;
use std::fmt::Debug;
use std::sync::Arc;

/// A container as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMeta {
    /// Container name
    pub name: String,
    /// Creation time, when the provider reports one
    pub created: Option<DateTime<Utc>>,
}

/// One storage provider
#[async_trait]
pub trait Backend: Debug + Send + Sync {
    /// Short identifier reported by `FilePool::info`
    fn name(&self) -> &'static str;

    /// Enumerate every container visible with the configured credentials
    async fn list_containers(&self) -> Result<Vec<ContainerMeta>>;

    /// Create a new, empty container
    async fn create_container(&self, name: &str) -> Result<()>;

    /// Delete an empty container
    async fn delete_container(&self, name: &str) -> Result<()>;

    /// Object-level access to one container
    fn container(&self, name: &str) -> Result<Arc<dyn ObjectStore>>;
}
