use crate::error::Result;
use crate::filesystem::node::DirectoryNode;

/// The current working directory, kept as the names walked from the root.
///
/// The node itself is re-derived from the root on demand, so the cursor
/// never borrows from the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCursor {
    segments: Vec<String>,
}

impl PathCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor at the directory reached by walking `segments` from the root.
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// `/` at the root, otherwise `/a/b/` with leading and trailing slash.
    pub fn current_path(&self) -> String {
        let mut path = String::from("/");
        for seg in &self.segments {
            path.push_str(seg);
            path.push('/');
        }
        path
    }

    /// Path of a child of the current directory, e.g. `/a/notes.txt`.
    pub fn child_path(&self, name: &str) -> String {
        format!("{}{name}", self.current_path())
    }

    pub fn resolve<'a>(&self, root: &'a DirectoryNode) -> Result<&'a DirectoryNode> {
        root.descend(&self.segments)
    }

    pub fn resolve_mut<'a>(&self, root: &'a mut DirectoryNode) -> Result<&'a mut DirectoryNode> {
        root.descend_mut(&self.segments)
    }

    /// Step into `name`, or up one level for `..`.
    ///
    /// Returns `false` when `name` is not a subdirectory of the current node;
    /// the cursor is left unchanged.
    pub fn change_directory(&mut self, root: &DirectoryNode, name: &str) -> bool {
        if name == ".." {
            self.segments.pop();
            // Re-walk from the root; fall back to the root if the path vanished.
            if self.resolve(root).is_err() {
                self.segments.clear();
            }
            return true;
        }

        let is_dir = self
            .resolve(root)
            .ok()
            .and_then(|node| node.resolve_child(name).ok())
            .is_some_and(|entry| entry.as_dir().is_some());
        if is_dir {
            self.segments.push(name.to_string());
        }
        is_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::node::EntryKind;

    fn tree() -> DirectoryNode {
        let mut root = DirectoryNode::new();
        let a = root.create_child("a", EntryKind::Dir).unwrap();
        let a = a.as_dir_mut().unwrap();
        a.create_child("b", EntryKind::Dir).unwrap();
        a.create_child("file", EntryKind::File).unwrap();
        root
    }

    #[test]
    fn path_rendering() {
        let cursor = PathCursor::new();
        assert_eq!(cursor.current_path(), "/");
        assert_eq!(cursor.child_path("x"), "/x");

        let cursor = PathCursor::from_segments(vec!["a".into(), "b".into()]);
        assert_eq!(cursor.current_path(), "/a/b/");
        assert_eq!(cursor.child_path("x"), "/a/b/x");
    }

    #[test]
    fn descend_and_ascend() {
        let root = tree();
        let mut cursor = PathCursor::new();
        assert!(cursor.change_directory(&root, "a"));
        assert!(cursor.change_directory(&root, "b"));
        assert_eq!(cursor.current_path(), "/a/b/");

        assert!(cursor.change_directory(&root, ".."));
        assert_eq!(cursor.current_path(), "/a/");
        let node = cursor.resolve(&root).unwrap();
        assert!(node.contains("b") && node.contains("file"));
    }

    #[test]
    fn ascend_at_root_stays_at_root() {
        let root = tree();
        let mut cursor = PathCursor::new();
        assert!(cursor.change_directory(&root, ".."));
        assert!(cursor.is_root());
    }

    #[test]
    fn missing_or_file_target_is_soft_failure() {
        let root = tree();
        let mut cursor = PathCursor::from_segments(vec!["a".into()]);
        assert!(!cursor.change_directory(&root, "missing"));
        assert!(!cursor.change_directory(&root, "file"));
        assert!(!cursor.change_directory(&root, ""));
        assert!(!cursor.change_directory(&root, "."));
        assert!(!cursor.change_directory(&root, "a/b"));
        assert_eq!(cursor.current_path(), "/a/");
    }
}
