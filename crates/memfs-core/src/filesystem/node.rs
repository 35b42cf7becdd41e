use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MemFsError, Result};
use crate::filesystem::record::FileRecord;

/// Kind of entry to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A child of a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entry {
    File(FileRecord),
    Dir(DirectoryNode),
}

impl Entry {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::File(_) => EntryKind::File,
            Self::Dir(_) => EntryKind::Dir,
        }
    }

    pub fn as_file(&self) -> Option<&FileRecord> {
        match self {
            Self::File(f) => Some(f),
            Self::Dir(_) => None,
        }
    }

    pub fn as_file_mut(&mut self) -> Option<&mut FileRecord> {
        match self {
            Self::File(f) => Some(f),
            Self::Dir(_) => None,
        }
    }

    pub fn as_dir(&self) -> Option<&DirectoryNode> {
        match self {
            Self::Dir(d) => Some(d),
            Self::File(_) => None,
        }
    }

    pub fn as_dir_mut(&mut self) -> Option<&mut DirectoryNode> {
        match self {
            Self::Dir(d) => Some(d),
            Self::File(_) => None,
        }
    }
}

/// Entry names are single path segments: non-empty, not `.` or `..`, and
/// free of `/`.
fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(MemFsError::InvalidArgument(format!("invalid name: {name:?}")));
    }
    Ok(())
}

/// A directory: children keyed by name, owned by value.
///
/// Nodes carry no parent link. Ascent is handled by re-walking from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    children: BTreeMap<String, Entry>,
}

impl DirectoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve_child(&self, name: &str) -> Result<&Entry> {
        self.children
            .get(name)
            .ok_or_else(|| MemFsError::not_found(name))
    }

    pub fn resolve_child_mut(&mut self, name: &str) -> Result<&mut Entry> {
        self.children
            .get_mut(name)
            .ok_or_else(|| MemFsError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Insert a fresh, empty file or directory under `name`.
    pub fn create_child(&mut self, name: &str, kind: EntryKind) -> Result<&mut Entry> {
        check_name(name)?;
        if self.children.contains_key(name) {
            return Err(MemFsError::already_exists(name));
        }
        let entry = match kind {
            EntryKind::File => Entry::File(FileRecord::new(name)),
            EntryKind::Dir => Entry::Dir(DirectoryNode::new()),
        };
        Ok(self.children.entry(name.to_string()).or_insert(entry))
    }

    /// Detach `name` and hand its whole subtree to the caller.
    pub fn remove_child(&mut self, name: &str) -> Result<Entry> {
        self.children
            .remove(name)
            .ok_or_else(|| MemFsError::not_found(name))
    }

    /// Move the entry bound to `source` under `destination`.
    pub fn rebind(&mut self, source: &str, destination: &str) -> Result<()> {
        if !self.children.contains_key(source) {
            return Err(MemFsError::not_found(source));
        }
        check_name(destination)?;
        if self.children.contains_key(destination) {
            return Err(MemFsError::already_exists(destination));
        }
        let mut entry = self.remove_child(source)?;
        if let Entry::File(f) = &mut entry {
            f.rename(destination);
        }
        self.children.insert(destination.to_string(), entry);
        Ok(())
    }

    /// Children in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Follow a sequence of directory names down from this node.
    pub fn descend<S: AsRef<str>>(&self, segments: &[S]) -> Result<&DirectoryNode> {
        let mut node = self;
        for seg in segments {
            let seg = seg.as_ref();
            node = node
                .resolve_child(seg)?
                .as_dir()
                .ok_or_else(|| MemFsError::not_found(seg))?;
        }
        Ok(node)
    }

    pub fn descend_mut<S: AsRef<str>>(&mut self, segments: &[S]) -> Result<&mut DirectoryNode> {
        let mut node = self;
        for seg in segments {
            let seg = seg.as_ref();
            node = node
                .resolve_child_mut(seg)?
                .as_dir_mut()
                .ok_or_else(|| MemFsError::not_found(seg))?;
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::filesystem::record::OpenMode;

    #[test]
    fn create_and_resolve() {
        let mut root = DirectoryNode::new();
        root.create_child("a.txt", EntryKind::File).unwrap();
        root.create_child("sub", EntryKind::Dir).unwrap();

        assert_eq!(root.resolve_child("a.txt").unwrap().kind(), EntryKind::File);
        assert_eq!(root.resolve_child("sub").unwrap().kind(), EntryKind::Dir);
        let err = root.resolve_child("nope").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let mut root = DirectoryNode::new();
        root.create_child("x", EntryKind::File).unwrap();
        let err = root.create_child("x", EntryKind::Dir).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);

        root.remove_child("x").unwrap();
        root.create_child("x", EntryKind::Dir).unwrap();
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn remove_returns_subtree() {
        let mut root = DirectoryNode::new();
        let sub = root.create_child("sub", EntryKind::Dir).unwrap();
        sub.as_dir_mut()
            .unwrap()
            .create_child("inner", EntryKind::File)
            .unwrap();

        let removed = root.remove_child("sub").unwrap();
        assert!(removed.as_dir().unwrap().contains("inner"));
        assert!(root.is_empty());
        assert_eq!(root.remove_child("sub").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn rebind_keeps_descendants() {
        let mut root = DirectoryNode::new();
        let sub = root.create_child("old", EntryKind::Dir).unwrap();
        sub.as_dir_mut()
            .unwrap()
            .create_child("kept", EntryKind::File)
            .unwrap();

        root.rebind("old", "new").unwrap();
        assert!(!root.contains("old"));
        assert!(root.descend(&["new"]).unwrap().contains("kept"));
    }

    #[test]
    fn rebind_renames_file_record() {
        let mut root = DirectoryNode::new();
        let f = root.create_child("a", EntryKind::File).unwrap();
        f.as_file_mut().unwrap().open(OpenMode::Append).append("hi").unwrap();

        root.rebind("a", "b").unwrap();
        let moved = root.resolve_child("b").unwrap().as_file().unwrap();
        assert_eq!(moved.name(), "b");
        assert_eq!(moved.content(), "hi");
    }

    #[test]
    fn rebind_errors() {
        let mut root = DirectoryNode::new();
        root.create_child("a", EntryKind::File).unwrap();
        root.create_child("b", EntryKind::File).unwrap();
        assert_eq!(root.rebind("zz", "c").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(root.rebind("a", "b").unwrap_err().kind(), ErrorKind::AlreadyExists);
    }

    #[test]
    fn descend_rejects_files() {
        let mut root = DirectoryNode::new();
        root.create_child("f", EntryKind::File).unwrap();
        assert!(root.descend(&["f"]).is_err());
        assert!(root.descend::<&str>(&[]).is_ok());
    }

    #[test]
    fn names_must_be_single_segments() {
        let mut dir = DirectoryNode::new();
        for bad in ["", ".", "..", "a/b", "/"] {
            let err = dir.create_child(bad, EntryKind::Dir).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "name: {bad:?}");
        }
        assert!(dir.is_empty());

        dir.create_child("x", EntryKind::File).unwrap();
        let err = dir.rebind("x", "y/z").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(dir.contains("x"));
        assert_eq!(dir.rebind("ghost", "..").unwrap_err().kind(), ErrorKind::NotFound);
    }
}
