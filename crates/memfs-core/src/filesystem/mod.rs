pub mod cursor;
pub mod engine;
pub mod node;
pub mod record;

use serde::Serialize;

use node::EntryKind;
use record::OpenMode;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Character count, files only.
    pub size: Option<usize>,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// One row of the whole-tree memory map, in depth-first pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapEntry {
    /// Nesting level; children of the root are at depth 0.
    pub depth: usize,
    pub name: String,
    /// Absolute path, with a trailing slash for directories.
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<usize>,
}

/// The file currently bound to the engine-wide open handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenFile {
    pub path: String,
    pub name: String,
    pub mode: OpenMode,
}

/// Tree-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub dir_count: usize,
    pub file_count: usize,
    pub total_chars: usize,
}

pub use cursor::PathCursor;
pub use engine::{FileSystem, FsState};
pub use node::{DirectoryNode, Entry};
pub use record::FileRecord;
