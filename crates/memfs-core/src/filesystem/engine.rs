use std::cell::RefCell;

use parking_lot::ReentrantMutex;
use tracing::debug;

use crate::error::{MemFsError, Result};
use crate::filesystem::cursor::PathCursor;
use crate::filesystem::node::{DirectoryNode, Entry, EntryKind};
use crate::filesystem::record::{FileRecord, OpenMode};
use crate::filesystem::{DirEntry, MapEntry, OpenFile, Stats};

fn no_open_file() -> MemFsError {
    MemFsError::InvalidState("No file is open.".to_string())
}

/// Everything the engine lock guards: the tree, the cursor and the open handle.
///
/// Methods here assume the caller already holds the engine lock. A
/// [`FileSystem`] hands out one mutable borrow of it per public operation.
#[derive(Debug, Clone, Default)]
pub struct FsState {
    root: DirectoryNode,
    cursor: PathCursor,
    /// Root-relative names of the open file, the file name last.
    open: Option<Vec<String>>,
}

impl FsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        root: DirectoryNode,
        cursor: PathCursor,
        open: Option<Vec<String>>,
    ) -> Self {
        Self { root, cursor, open }
    }

    pub fn root(&self) -> &DirectoryNode {
        &self.root
    }

    pub fn cursor(&self) -> &PathCursor {
        &self.cursor
    }

    pub fn current_path(&self) -> String {
        self.cursor.current_path()
    }

    pub(crate) fn open_segments(&self) -> Option<&[String]> {
        self.open.as_deref()
    }

    fn cwd(&self) -> Result<&DirectoryNode> {
        self.cursor.resolve(&self.root)
    }

    fn cwd_mut(&mut self) -> Result<&mut DirectoryNode> {
        self.cursor.resolve_mut(&mut self.root)
    }

    fn child_segments(&self, name: &str) -> Vec<String> {
        let mut segments = self.cursor.segments().to_vec();
        segments.push(name.to_string());
        segments
    }

    fn open_record(&self) -> Option<&FileRecord> {
        let (name, dir) = self.open.as_ref()?.split_last()?;
        self.root
            .descend(dir)
            .ok()?
            .resolve_child(name)
            .ok()?
            .as_file()
    }

    fn open_record_mut(&mut self) -> Result<&mut FileRecord> {
        let path = self.open.as_ref().ok_or_else(no_open_file)?;
        let (name, dir) = path.split_last().ok_or_else(no_open_file)?;
        self.root
            .descend_mut(dir)
            .ok()
            .and_then(|d| d.resolve_child_mut(name).ok())
            .and_then(Entry::as_file_mut)
            .ok_or_else(no_open_file)
    }

    // ── Tree ────────────────────────────────────────────────────────

    pub fn create(&mut self, name: &str) -> Result<()> {
        self.cwd_mut()?.create_child(name, EntryKind::File)?;
        debug!(path = %self.cursor.child_path(name), "file created");
        Ok(())
    }

    pub fn mk_dir(&mut self, name: &str) -> Result<()> {
        self.cwd_mut()?.create_child(name, EntryKind::Dir)?;
        debug!(path = %self.cursor.child_path(name), "directory created");
        Ok(())
    }

    /// Remove a file or a whole directory subtree from the current directory.
    ///
    /// Drops the open handle if it pointed into what was removed.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.cwd_mut()?.remove_child(name)?;
        let removed = self.child_segments(name);
        if self.open.as_ref().is_some_and(|p| p.starts_with(&removed)) {
            self.open = None;
        }
        debug!(path = %self.cursor.child_path(name), "entry deleted");
        Ok(())
    }

    /// Rename an entry within the current directory.
    ///
    /// The open handle follows the entry if it points at it or into it.
    pub fn move_entry(&mut self, source: &str, destination: &str) -> Result<()> {
        self.cwd_mut()?.rebind(source, destination)?;
        let moved = self.child_segments(source);
        let at = moved.len() - 1;
        if let Some(path) = self.open.as_mut() {
            if path.starts_with(&moved) {
                path[at] = destination.to_string();
            }
        }
        debug!(from = source, to = destination, "entry moved");
        Ok(())
    }

    /// Returns `false` (and stays put) if `name` is not a subdirectory.
    pub fn change_directory(&mut self, name: &str) -> bool {
        let changed = self.cursor.change_directory(&self.root, name);
        debug!(dir = name, changed, path = %self.cursor.current_path(), "change directory");
        changed
    }

    /// Immediate children of the current directory, in name order.
    pub fn list_directory(&self) -> Result<Vec<DirEntry>> {
        Ok(self
            .cwd()?
            .entries()
            .map(|(name, entry)| DirEntry {
                name: name.to_string(),
                kind: entry.kind(),
                size: entry.as_file().map(FileRecord::size),
            })
            .collect())
    }

    /// The whole tree from the root, depth-first, parents before children.
    pub fn memory_map(&self) -> Vec<MapEntry> {
        let mut out = Vec::new();
        walk(&self.root, "/", 0, &mut out);
        out
    }

    pub fn stats(&self) -> Stats {
        let mut stats = Stats::default();
        for entry in self.memory_map() {
            match entry.size {
                Some(size) => {
                    stats.file_count += 1;
                    stats.total_chars += size;
                }
                None => stats.dir_count += 1,
            }
        }
        stats
    }

    // ── Open handle ─────────────────────────────────────────────────

    /// Bind the engine's single handle to `name`, replacing any previous one.
    ///
    /// The replaced file is not closed and keeps its mode.
    pub fn open_file(&mut self, name: &str, mode: OpenMode) -> Result<()> {
        self.cwd_mut()?
            .resolve_child_mut(name)?
            .as_file_mut()
            .ok_or_else(|| MemFsError::not_found(name))?
            .open(mode);
        self.open = Some(self.child_segments(name));
        debug!(path = %self.cursor.child_path(name), %mode, "file opened");
        Ok(())
    }

    pub fn close_file(&mut self) -> Result<()> {
        if self.open.is_none() {
            return Err(no_open_file());
        }
        if let Ok(record) = self.open_record_mut() {
            record.close();
        }
        self.open = None;
        debug!("file closed");
        Ok(())
    }

    /// The bound file and its mode, or `None` when no handle is open.
    pub fn open_file_info(&self) -> Option<OpenFile> {
        let path = self.open.as_ref()?;
        Some(OpenFile {
            path: format!("/{}", path.join("/")),
            name: path.last()?.clone(),
            mode: self.open_record()?.mode()?,
        })
    }

    /// Insert into the open file. Needs a handle opened with `w`.
    pub fn write_file(&mut self, text: &str, offset: usize) -> Result<()> {
        self.open_record_mut()?.write_at(text, offset)
    }

    /// Append to the open file. Needs a handle opened with `a`.
    pub fn append_file(&mut self, text: &str) -> Result<()> {
        self.open_record_mut()?.append(text)
    }

    // ── Self-contained content operations ──────────────────────────
    //
    // These open `name` themselves and close it afterwards, replacing
    // whatever handle was bound before.

    pub fn read_file(&mut self, name: &str, start: usize, size: Option<usize>) -> Result<String> {
        self.open_file(name, OpenMode::Read)?;
        let text = self.open_record_mut()?.read_range(start, size)?;
        self.close_file()?;
        Ok(text)
    }

    pub fn move_file(&mut self, name: &str, start: usize, length: usize, target: usize) -> Result<()> {
        self.open_file(name, OpenMode::Write)?;
        self.open_record_mut()?.move_within(start, length, target)?;
        self.close_file()
    }

    pub fn truncate_file(&mut self, name: &str, size: usize) -> Result<()> {
        self.open_file(name, OpenMode::Write)?;
        self.open_record_mut()?.truncate(size)?;
        self.close_file()
    }
}

fn walk(node: &DirectoryNode, prefix: &str, depth: usize, out: &mut Vec<MapEntry>) {
    for (name, entry) in node.entries() {
        match entry {
            Entry::File(f) => out.push(MapEntry {
                depth,
                name: name.to_string(),
                path: format!("{prefix}{name}"),
                kind: EntryKind::File,
                size: Some(f.size()),
            }),
            Entry::Dir(d) => {
                let path = format!("{prefix}{name}/");
                out.push(MapEntry {
                    depth,
                    name: name.to_string(),
                    path: path.clone(),
                    kind: EntryKind::Dir,
                    size: None,
                });
                walk(d, &path, depth + 1, out);
            }
        }
    }
}

/// Thread-safe handle to one shared tree.
///
/// Every public operation takes the single engine lock for its whole
/// duration, so operations from different threads are totally ordered.
/// The lock is reentrant: a thread already holding it (inside
/// [`FileSystem::transaction`]) may call any other operation.
#[derive(Debug, Default)]
pub struct FileSystem {
    state: ReentrantMutex<RefCell<FsState>>,
}

impl FileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: FsState) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(state)),
        }
    }

    pub fn into_state(self) -> FsState {
        self.state.into_inner().into_inner()
    }

    /// Hold the engine lock while `f` runs, so nothing from another thread
    /// lands between the operations `f` performs on this file system.
    pub fn transaction<T>(&self, f: impl FnOnce(&Self) -> T) -> T {
        let _guard = self.state.lock();
        f(self)
    }

    /// One step against the guarded state. `f` must not call back into
    /// this `FileSystem`; the state is mutably borrowed for its duration.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut FsState) -> T) -> T {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    pub fn create(&self, name: &str) -> Result<()> {
        self.with_state(|s| s.create(name))
    }

    pub fn mk_dir(&self, name: &str) -> Result<()> {
        self.with_state(|s| s.mk_dir(name))
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        self.with_state(|s| s.delete(name))
    }

    pub fn move_entry(&self, source: &str, destination: &str) -> Result<()> {
        self.with_state(|s| s.move_entry(source, destination))
    }

    pub fn change_directory(&self, name: &str) -> bool {
        self.with_state(|s| s.change_directory(name))
    }

    pub fn list_directory(&self) -> Result<Vec<DirEntry>> {
        self.with_state(|s| s.list_directory())
    }

    pub fn memory_map(&self) -> Vec<MapEntry> {
        self.with_state(|s| s.memory_map())
    }

    pub fn stats(&self) -> Stats {
        self.with_state(|s| s.stats())
    }

    pub fn current_path(&self) -> String {
        self.with_state(|s| s.current_path())
    }

    pub fn open_file(&self, name: &str, mode: OpenMode) -> Result<()> {
        self.with_state(|s| s.open_file(name, mode))
    }

    pub fn close_file(&self) -> Result<()> {
        self.with_state(|s| s.close_file())
    }

    pub fn open_file_info(&self) -> Option<OpenFile> {
        self.with_state(|s| s.open_file_info())
    }

    pub fn write_file(&self, text: &str, offset: usize) -> Result<()> {
        self.with_state(|s| s.write_file(text, offset))
    }

    pub fn append_file(&self, text: &str) -> Result<()> {
        self.with_state(|s| s.append_file(text))
    }

    pub fn read_file(&self, name: &str, start: usize, size: Option<usize>) -> Result<String> {
        self.with_state(|s| s.read_file(name, start, size))
    }

    pub fn move_file(&self, name: &str, start: usize, length: usize, target: usize) -> Result<()> {
        self.with_state(|s| s.move_file(name, start, length, target))
    }

    pub fn truncate_file(&self, name: &str, size: usize) -> Result<()> {
        self.with_state(|s| s.truncate_file(name, size))
    }
}
