//! Pool-to-pool file transfer

use crate::{Result, Siphonable};
use tracing::debug;

/// Stream the file at `src_path` in `src` to `dest_path` in `dest`.
///
/// A failed `get` returns before `dest` is touched. The reader is handed to
/// `put` as-is, so nothing beyond the destination's own write buffer is held in
/// memory.
pub fn siphon_file(
    src: &dyn Siphonable,
    src_path: &str,
    dest: &dyn Siphonable,
    dest_path: &str,
) -> Result<()> {
    let mut reader = src.get(src_path)?;
    debug!("Siphoning {} to {}", src_path, dest_path);
    dest.put(dest_path, &mut reader)
}
