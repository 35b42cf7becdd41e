use std::path::{Path, PathBuf};

/// Default snapshot file, relative to the working directory.
pub const DEFAULT_SNAPSHOT: &str = "sample.dat";

/// How the snapshot JSON is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SnapshotFormat {
    /// Single-line JSON. **Default.**
    Compact,
    /// Indented JSON, easier to diff by hand.
    Pretty,
}

impl Default for SnapshotFormat {
    fn default() -> Self {
        Self::Compact
    }
}

impl std::fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compact => write!(f, "compact"),
            Self::Pretty => write!(f, "pretty"),
        }
    }
}

impl std::str::FromStr for SnapshotFormat {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown snapshot format: {other}")),
        }
    }
}

/// Configuration for a memfs session.
#[derive(Debug, Clone)]
pub struct MemFsConfig {
    /// File the tree is loaded from and saved to.
    pub snapshot_path: PathBuf,
    /// Snapshot layout.
    pub format: SnapshotFormat,
    /// Save on exit (shell) or after all workers join (batch).
    pub autosave: bool,
    /// Directory for batch result logs. `None` writes each log beside its input.
    pub log_dir: Option<PathBuf>,
}

impl MemFsConfig {
    /// Create a config builder for the given snapshot path.
    pub fn builder(snapshot_path: impl AsRef<Path>) -> MemFsConfigBuilder {
        MemFsConfigBuilder {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            format: SnapshotFormat::default(),
            autosave: true,
            log_dir: None,
        }
    }
}

impl Default for MemFsConfig {
    fn default() -> Self {
        Self::builder(DEFAULT_SNAPSHOT).build()
    }
}

/// Builder for [`MemFsConfig`].
#[derive(Debug, Clone)]
pub struct MemFsConfigBuilder {
    snapshot_path: PathBuf,
    format: SnapshotFormat,
    autosave: bool,
    log_dir: Option<PathBuf>,
}

impl MemFsConfigBuilder {
    pub fn format(mut self, format: SnapshotFormat) -> Self {
        self.format = format;
        self
    }

    pub fn autosave(mut self, yes: bool) -> Self {
        self.autosave = yes;
        self
    }

    pub fn log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn build(self) -> MemFsConfig {
        MemFsConfig {
            snapshot_path: self.snapshot_path,
            format: self.format,
            autosave: self.autosave,
            log_dir: self.log_dir,
        }
    }
}
