//! Tokio runtime management for blocking pool calls

use crate::{CloudError, Result};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

/// Get or create the runtime every pool, reader and writer blocks on.
///
/// Pool calls must not be made from inside another tokio runtime: `block_on`
/// panics there.
pub(crate) fn shared_runtime() -> Result<Arc<Runtime>> {
    static RUNTIME: OnceLock<Arc<Runtime>> = OnceLock::new();

    if let Some(runtime) = RUNTIME.get() {
        return Ok(runtime.clone());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("siphon-cloud-worker")
        .build()
        .map_err(|e| CloudError::Runtime(format!("Failed to create Tokio runtime: {}", e)))?;

    Ok(RUNTIME.get_or_init(|| Arc::new(runtime)).clone())
}
