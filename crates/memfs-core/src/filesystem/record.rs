use serde::{Deserialize, Serialize};

use crate::error::{MemFsError, Result};

/// Access mode a file is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenMode {
    Read,
    Write,
    Append,
}

impl OpenMode {
    fn describe(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Append => "append",
        }
    }
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "r"),
            Self::Write => write!(f, "w"),
            Self::Append => write!(f, "a"),
        }
    }
}

impl std::str::FromStr for OpenMode {
    type Err = MemFsError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" => Ok(Self::Read),
            "w" => Ok(Self::Write),
            "a" => Ok(Self::Append),
            _ => Err(MemFsError::InvalidArgument(
                "Mode must be 'r', 'w', or 'a'.".to_string(),
            )),
        }
    }
}

/// A single file: name, character content and the transient open mode.
///
/// Offsets and lengths count characters, not bytes. Size is always derived
/// from the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    name: String,
    content: String,
    #[serde(skip)]
    mode: Option<OpenMode>,
}

impl FileRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            mode: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of characters in the content.
    pub fn size(&self) -> usize {
        self.content.chars().count()
    }

    pub fn mode(&self) -> Option<OpenMode> {
        self.mode
    }

    pub fn open(&mut self, mode: OpenMode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.mode = None;
        self
    }

    fn require(&self, mode: OpenMode) -> Result<()> {
        if self.mode == Some(mode) {
            Ok(())
        } else {
            Err(MemFsError::InvalidState(format!(
                "File must be opened in {} mode.",
                mode.describe()
            )))
        }
    }

    pub fn append(&mut self, text: &str) -> Result<()> {
        self.require(OpenMode::Append)?;
        self.content.push_str(text);
        Ok(())
    }

    /// Insert `text` at character `offset`. Offsets past the end insert at the end.
    pub fn write_at(&mut self, text: &str, offset: usize) -> Result<()> {
        self.require(OpenMode::Write)?;
        let at = byte_index(&self.content, offset);
        self.content.insert_str(at, text);
        Ok(())
    }

    /// Read `size` characters from `start`, or everything after `start`.
    pub fn read_range(&self, start: usize, size: Option<usize>) -> Result<String> {
        self.require(OpenMode::Read)?;
        let tail = self.content.chars().skip(start);
        Ok(match size {
            Some(n) => tail.take(n).collect(),
            None => tail.collect(),
        })
    }

    /// Cut `content[start..start + length]` and reinsert it.
    ///
    /// `target` indexes the content with the slice already removed. A target
    /// beyond that shortened content appends the slice at the very end.
    pub fn move_within(&mut self, start: usize, length: usize, target: usize) -> Result<()> {
        self.require(OpenMode::Write)?;
        let mut chars: Vec<char> = self.content.chars().collect();
        let from = start.min(chars.len());
        let to = start.saturating_add(length).min(chars.len());
        let moved: Vec<char> = chars.drain(from..to).collect();

        if target > chars.len() {
            chars.extend(moved);
        } else {
            chars.splice(target..target, moved);
        }
        self.content = chars.into_iter().collect();
        Ok(())
    }

    /// Keep the first `size` characters. Larger sizes leave the content alone.
    pub fn truncate(&mut self, size: usize) -> Result<()> {
        self.require(OpenMode::Write)?;
        let at = byte_index(&self.content, size);
        self.content.truncate(at);
        Ok(())
    }
}

/// Byte position of character `idx`, clamped to the end of `s`.
fn byte_index(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map_or(s.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn file_with(content: &str) -> FileRecord {
        let mut f = FileRecord::new("f");
        f.open(OpenMode::Append).append(content).unwrap();
        f.close();
        f
    }

    #[test]
    fn parse_mode() {
        assert_eq!("r".parse::<OpenMode>().unwrap(), OpenMode::Read);
        assert_eq!("w".parse::<OpenMode>().unwrap(), OpenMode::Write);
        assert_eq!("a".parse::<OpenMode>().unwrap(), OpenMode::Append);
        let err = "rw".parse::<OpenMode>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn mode_is_enforced() {
        let mut f = FileRecord::new("f");
        assert_eq!(f.append("x").unwrap_err().kind(), ErrorKind::InvalidState);
        f.open(OpenMode::Read);
        assert_eq!(f.write_at("x", 0).unwrap_err().kind(), ErrorKind::InvalidState);
        assert_eq!(f.truncate(0).unwrap_err().kind(), ErrorKind::InvalidState);
        f.open(OpenMode::Write);
        assert_eq!(f.read_range(0, None).unwrap_err().kind(), ErrorKind::InvalidState);
        f.close().close();
        assert_eq!(f.mode(), None);
    }

    #[test]
    fn append_and_size() {
        let mut f = FileRecord::new("f");
        f.open(OpenMode::Append);
        f.append("hello").unwrap();
        f.append(" world").unwrap();
        assert_eq!(f.content(), "hello world");
        assert_eq!(f.size(), 11);
    }

    #[test]
    fn write_inserts_at_offset() {
        let mut f = file_with("helloworld");
        f.open(OpenMode::Write);
        f.write_at(", ", 5).unwrap();
        assert_eq!(f.content(), "hello, world");
        f.write_at("!", 500).unwrap();
        assert_eq!(f.content(), "hello, world!");
        assert_eq!(f.size(), 13);
    }

    #[test]
    fn offsets_count_characters() {
        let mut f = file_with("héllo");
        assert_eq!(f.size(), 5);
        f.open(OpenMode::Write);
        f.write_at("X", 2).unwrap();
        assert_eq!(f.content(), "héXllo");
        f.truncate(2).unwrap();
        assert_eq!(f.content(), "hé");
        assert_eq!(f.size(), 2);
    }

    #[test]
    fn read_range_clamps() {
        let mut f = file_with("abcdef");
        f.open(OpenMode::Read);
        assert_eq!(f.read_range(0, None).unwrap(), "abcdef");
        assert_eq!(f.read_range(2, Some(3)).unwrap(), "cde");
        assert_eq!(f.read_range(4, Some(100)).unwrap(), "ef");
        assert_eq!(f.read_range(100, None).unwrap(), "");
    }

    #[test]
    fn move_within_past_end_appends() {
        let mut f = file_with("ABCDEFGH");
        f.open(OpenMode::Write);
        f.move_within(2, 3, 100).unwrap();
        assert_eq!(f.content(), "ABFGHCDE");
        assert_eq!(f.size(), 8);
    }

    #[test]
    fn move_within_inserts_into_shortened_content() {
        let mut f = file_with("ABCDEFGH");
        f.open(OpenMode::Write);
        f.move_within(2, 3, 1).unwrap();
        assert_eq!(f.content(), "ACDEBFGH");
    }

    #[test]
    fn move_within_target_at_shortened_end() {
        let mut f = file_with("ABCDEFGH");
        f.open(OpenMode::Write);
        // "ABFGH" has length 5, so target 5 inserts at the end.
        f.move_within(2, 3, 5).unwrap();
        assert_eq!(f.content(), "ABFGHCDE");
    }

    #[test]
    fn move_within_out_of_range_slice() {
        let mut f = file_with("ABC");
        f.open(OpenMode::Write);
        f.move_within(10, 2, 0).unwrap();
        assert_eq!(f.content(), "ABC");
        f.move_within(1, 10, 0).unwrap();
        assert_eq!(f.content(), "BCA");
    }

    #[test]
    fn truncate_tolerates_large_size() {
        let mut f = file_with("abc");
        f.open(OpenMode::Write);
        f.truncate(10).unwrap();
        assert_eq!(f.content(), "abc");
        f.truncate(1).unwrap();
        assert_eq!(f.content(), "a");
        assert_eq!(f.size(), 1);
    }

    #[test]
    fn mode_is_not_serialized() {
        let mut f = file_with("data");
        f.open(OpenMode::Write);
        let json = serde_json::to_string(&f).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode(), None);
        assert_eq!(back.content(), "data");
    }
}
