//! Backend seam: what a repository protocol client must provide.

use std::fmt;
use std::future::Future;

use crate::error::BackendError;
use crate::location::{Credentials, RepositoryLocation};
use crate::session::SchemeRegistry;

/// Revision number in the repository protocol's convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision(i64);

impl Revision {
    /// Most recent revision.
    pub const HEAD: Revision = Revision(-1);

    pub fn number(rev: u64) -> Self {
        Self(i64::try_from(rev).unwrap_or(i64::MAX))
    }

    pub fn is_head(&self) -> bool {
        self.0 < 0
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_head() {
            f.write_str("HEAD")
        } else {
            write!(f, "r{}", self.0)
        }
    }
}

/// Classification of a node at some revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
    Missing,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "dir",
            Self::File => "file",
            Self::Missing => "none",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Children of a directory in the order the backend enumerated them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub entries: Vec<DirEntry>,
}

impl DirectoryListing {
    pub fn new(entries: Vec<DirEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `"<name> <kind> <name> <kind> ..."`, trimmed.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{} {}", entry.name, entry.kind))
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

/// Complete contents of a file plus its commit metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub committed_date: Option<String>,
    pub committed_rev: Option<i64>,
}

impl FileContent {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// A protocol client able to open sessions for some set of URL schemes.
pub trait RepositoryBackend: Send + Sync + 'static {
    type Session: RepositorySession;

    /// Add the URL schemes this backend serves. Must be idempotent.
    fn register_schemes(&self, registry: &mut SchemeRegistry);

    /// Open a session. No authentication round trip happens here; bad
    /// credentials surface on the first session call.
    fn open(
        &self,
        location: RepositoryLocation,
        credentials: Credentials,
    ) -> impl Future<Output = Result<Self::Session, BackendError>> + Send;
}

/// An open, authenticated handle to one repository.
///
/// Dropping the session releases it.
pub trait RepositorySession: Send + Sync {
    fn location(&self) -> &RepositoryLocation;

    /// Kind of the node at `path` (root-relative, no leading `/`).
    fn check_path(
        &self,
        path: &str,
        rev: Revision,
    ) -> impl Future<Output = Result<NodeKind, BackendError>> + Send;

    /// Immediate children of the directory at `path`.
    fn get_dir(
        &self,
        path: &str,
        rev: Revision,
    ) -> impl Future<Output = Result<Vec<DirEntry>, BackendError>> + Send;

    /// Whole contents of the file at `path`.
    fn get_file(
        &self,
        path: &str,
        rev: Revision,
    ) -> impl Future<Output = Result<FileContent, BackendError>> + Send;
}
