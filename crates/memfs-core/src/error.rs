/// All errors produced by memfs-core.
#[derive(Debug, thiserror::Error)]
pub enum MemFsError {
    #[error("not found: {name}")]
    NotFound { name: String },

    #[error("already exists: {name}")]
    AlreadyExists { name: String },

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace snapshot: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// The coarse category of a [`MemFsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidState,
    InvalidArgument,
    /// Snapshot read/write failures.
    Storage,
}

impl MemFsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Io(_) | Self::Json(_) | Self::Persist(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub(crate) fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, MemFsError>;
