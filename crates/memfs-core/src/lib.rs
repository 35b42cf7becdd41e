//! In-memory hierarchical filesystem.
//!
//! A [`FileSystem`] owns a tree of directories and files, a working-directory
//! cursor and one engine-wide open-file handle, all behind a single lock.
//! The tree can be saved to and restored from a JSON snapshot.

pub mod command;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod snapshot;

pub use command::Command;
pub use config::{MemFsConfig, SnapshotFormat};
pub use error::{ErrorKind, MemFsError, Result};
pub use filesystem::record::OpenMode;
pub use filesystem::{DirEntry, FileSystem, FsState, MapEntry, OpenFile, Stats};
