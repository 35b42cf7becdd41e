use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{MemFsConfig, SnapshotFormat};
use crate::error::Result;
use crate::filesystem::node::{DirectoryNode, Entry};
use crate::filesystem::record::OpenMode;
use crate::filesystem::{FileSystem, FsState, PathCursor};

/// Identity of the open handle at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct HandleRecord {
    path: Vec<String>,
    mode: OpenMode,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    root: &'a DirectoryNode,
    cwd: &'a [String],
    open_file: Option<HandleRecord>,
}

/// Owned form of the on-disk snapshot. The lock is never part of it.
#[derive(Debug, Deserialize)]
struct Snapshot {
    root: DirectoryNode,
    /// Directory names from the root to the cursor.
    cwd: Vec<String>,
    #[serde(default)]
    open_file: Option<HandleRecord>,
}

fn capture(state: &FsState) -> SnapshotRef<'_> {
    let open_file = state
        .open_segments()
        .zip(state.open_file_info())
        .map(|(path, info)| HandleRecord {
            path: path.to_vec(),
            mode: info.mode,
        });
    SnapshotRef {
        root: state.root(),
        cwd: state.cursor().segments(),
        open_file,
    }
}

/// Serialize the whole state to bytes.
pub fn encode(state: &FsState, format: SnapshotFormat) -> Result<Vec<u8>> {
    let snapshot = capture(state);
    let bytes = match format {
        SnapshotFormat::Compact => serde_json::to_vec(&snapshot)?,
        SnapshotFormat::Pretty => serde_json::to_vec_pretty(&snapshot)?,
    };
    Ok(bytes)
}

/// Rebuild state from bytes produced by [`encode`].
///
/// A cursor path that no longer resolves falls back to the root. An open
/// handle is rebound and its file reopened in the saved mode; one that
/// doesn't resolve to a file is dropped.
pub fn decode(bytes: &[u8]) -> Result<FsState> {
    let Snapshot {
        mut root,
        cwd,
        open_file,
    } = serde_json::from_slice(bytes)?;

    let mut cursor = PathCursor::from_segments(cwd);
    if cursor.resolve(&root).is_err() {
        warn!(path = %cursor.current_path(), "saved cursor does not resolve, starting at /");
        cursor = PathCursor::new();
    }

    let open = open_file.and_then(|handle| {
        let (name, dir) = handle.path.split_last()?;
        let record = root
            .descend_mut(dir)
            .ok()?
            .resolve_child_mut(name)
            .ok()
            .and_then(Entry::as_file_mut);
        match record {
            Some(record) => {
                record.open(handle.mode);
                Some(handle.path)
            }
            None => {
                warn!(path = ?handle.path, "saved open file does not resolve, dropping handle");
                None
            }
        }
    });

    Ok(FsState::from_parts(root, cursor, open))
}

/// Write `bytes` next to `path` and rename over it.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}

impl FileSystem {
    /// Load the snapshot at `config.snapshot_path`. A missing file yields an
    /// empty filesystem.
    pub fn load(config: &MemFsConfig) -> Result<Self> {
        Self::load_from(&config.snapshot_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no snapshot, starting with a new file system");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let state = decode(&bytes)?;
        info!(path = %path.display(), "snapshot loaded");
        Ok(Self::from_state(state))
    }

    /// Save to `config.snapshot_path` in the configured format.
    pub fn save(&self, config: &MemFsConfig) -> Result<()> {
        self.save_to(&config.snapshot_path, config.format)
    }

    /// Atomically replace `path` with a full snapshot.
    ///
    /// Holds the engine lock for the whole write.
    pub fn save_to(&self, path: &Path, format: SnapshotFormat) -> Result<()> {
        self.with_state(|state| {
            let bytes = encode(state, format)?;
            replace_file(path, &bytes)?;
            info!(path = %path.display(), bytes = bytes.len(), %format, "snapshot saved");
            Ok(())
        })
    }
}
