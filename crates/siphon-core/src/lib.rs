//! # siphon-core
//!
//! Backend-independent pieces of file-siphon: listing records, pool path
//! parsing, the `FilePool`/`Siphonable` traits, configuration, and
//! `siphon_file`, which streams one file from a pool into another.
//!
//! Everything here is synchronous. Backends that talk to async clients block
//! internally (see `siphon-cloud`).

mod config;
mod error;
mod file;
mod path;
mod pool;
mod siphon;

pub use config::{AwsCredentials, PoolConfig, DEFAULT_REGION};
pub use error::{Error, Result};
pub use file::{FileEntry, FileInfo, FileKind};
pub use path::ParsedPath;
pub use pool::{FilePool, Siphonable};
pub use siphon::siphon_file;
