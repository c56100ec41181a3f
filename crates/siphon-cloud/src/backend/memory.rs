//! In-process backend built on `object_store::memory::InMemory`

use super::{Backend, ContainerMeta};
use crate::{CloudError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use object_store::memory::InMemory;
use object_store::ObjectStore;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug)]
struct Container {
    created: DateTime<Utc>,
    store: Arc<dyn ObjectStore>,
}

/// Containers held in memory, one `ObjectStore` each.
///
/// Any `ObjectStore` can be attached as a container with `insert_container`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    containers: Mutex<BTreeMap<String, Container>>,
}

impl MemoryBackend {
    /// An empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `store` as container `name`, replacing any existing one
    pub fn insert_container(&self, name: impl Into<String>, store: Arc<dyn ObjectStore>) {
        self.lock().insert(
            name.into(),
            Container {
                created: Utc::now(),
                store,
            },
        );
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Container>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.containers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_containers(&self) -> Result<Vec<ContainerMeta>> {
        Ok(self
            .lock()
            .iter()
            .map(|(name, container)| ContainerMeta {
                name: name.clone(),
                created: Some(container.created),
            })
            .collect())
    }

    async fn create_container(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CloudError::InvalidPath("empty container name".to_string()));
        }

        let mut containers = self.lock();
        if containers.contains_key(name) {
            return Err(CloudError::ContainerExists(name.to_string()));
        }
        containers.insert(
            name.to_string(),
            Container {
                created: Utc::now(),
                store: Arc::new(InMemory::new()),
            },
        );
        debug!("Created in-memory container {}", name);
        Ok(())
    }

    async fn delete_container(&self, name: &str) -> Result<()> {
        let store = self.container(name)?;
        if let Some(first) = store.list(None).next().await {
            first?;
            return Err(CloudError::ContainerNotEmpty(name.to_string()));
        }

        self.lock().remove(name);
        debug!("Deleted in-memory container {}", name);
        Ok(())
    }

    fn container(&self, name: &str) -> Result<Arc<dyn ObjectStore>> {
        self.lock()
            .get(name)
            .map(|container| container.store.clone())
            .ok_or_else(|| CloudError::ContainerNotFound(name.to_string()))
    }
}
