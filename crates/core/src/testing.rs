//! In-memory repository backend for tests.
//!
//! Counts opened and released sessions so tests can assert that every request
//! releases its session exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{BackendError, Operation};
use crate::location::{Credentials, RepositoryLocation};
use crate::repo::{
    DirEntry, FileContent, NodeKind, RepositoryBackend, RepositorySession, Revision,
};
use crate::session::SchemeRegistry;

/// Committed date stamped on files added without an explicit one.
pub const DEFAULT_COMMITTED_DATE: &str = "2024-05-01T12:00:00.000000Z";

/// Open/close/call counters shared between a backend and its sessions.
#[derive(Debug, Default)]
pub struct SessionStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
    calls: AtomicUsize,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Remote calls issued across all sessions.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sessions opened but not yet released.
    pub fn live(&self) -> usize {
        self.opened() - self.closed()
    }
}

#[derive(Debug, Clone)]
enum MemoryNode {
    Dir,
    File {
        bytes: Vec<u8>,
        date: Option<String>,
        rev: i64,
    },
}

/// Test double serving a fixed tree over `http`/`https` URLs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    nodes: Arc<Vec<(String, MemoryNode)>>,
    required: Option<(String, String)>,
    fail_on: Option<Operation>,
    refuse_open: bool,
    stats: Arc<SessionStats>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory at root-relative `path`. Parents are not created.
    pub fn with_dir(mut self, path: &str) -> Self {
        Arc::make_mut(&mut self.nodes).push((path.to_string(), MemoryNode::Dir));
        self
    }

    pub fn with_file(self, path: &str, bytes: &[u8]) -> Self {
        self.with_dated_file(path, bytes, DEFAULT_COMMITTED_DATE)
    }

    pub fn with_dated_file(self, path: &str, bytes: &[u8], date: &str) -> Self {
        self.push_file(path, bytes, Some(date.to_string()))
    }

    /// Add a file whose committed date the backend does not report.
    pub fn with_undated_file(self, path: &str, bytes: &[u8]) -> Self {
        self.push_file(path, bytes, None)
    }

    fn push_file(mut self, path: &str, bytes: &[u8], date: Option<String>) -> Self {
        let rev = self.nodes.len() as i64 + 1;
        Arc::make_mut(&mut self.nodes).push((
            path.to_string(),
            MemoryNode::File {
                bytes: bytes.to_vec(),
                date,
                rev,
            },
        ));
        self
    }

    /// Reject every call whose session was opened with other credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.required = Some((username.to_string(), password.to_string()));
        self
    }

    /// Make every `op` call fail with a transport error.
    pub fn failing(mut self, op: Operation) -> Self {
        self.fail_on = Some(op);
        self
    }

    /// Refuse to open sessions at all.
    pub fn unreachable(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    pub fn stats(&self) -> Arc<SessionStats> {
        Arc::clone(&self.stats)
    }
}

impl RepositoryBackend for MemoryBackend {
    type Session = MemorySession;

    fn register_schemes(&self, registry: &mut SchemeRegistry) {
        registry.register("http");
        registry.register("https");
    }

    async fn open(
        &self,
        location: RepositoryLocation,
        credentials: Credentials,
    ) -> Result<MemorySession, BackendError> {
        if self.refuse_open {
            return Err(BackendError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )));
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            location,
            credentials,
            backend: self.clone(),
        })
    }
}

/// Session over a [`MemoryBackend`]; bumps the close counter on drop.
#[derive(Debug)]
pub struct MemorySession {
    location: RepositoryLocation,
    credentials: Credentials,
    backend: MemoryBackend,
}

impl MemorySession {
    fn begin(&self, op: Operation) -> Result<(), BackendError> {
        self.backend.stats.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((user, pass)) = &self.backend.required {
            if self.credentials.username() != user || self.credentials.password() != pass {
                return Err(BackendError::Unauthorized);
            }
        }
        if self.backend.fail_on == Some(op) {
            return Err(BackendError::transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        Ok(())
    }

    fn node(&self, path: &str) -> Option<&MemoryNode> {
        self.backend
            .nodes
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, node)| node)
    }

    fn kind_of(&self, path: &str) -> NodeKind {
        if path.is_empty() {
            return NodeKind::Directory;
        }
        match self.node(path) {
            Some(MemoryNode::Dir) => NodeKind::Directory,
            Some(MemoryNode::File { .. }) => NodeKind::File,
            None => NodeKind::Missing,
        }
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

impl RepositorySession for MemorySession {
    fn location(&self) -> &RepositoryLocation {
        &self.location
    }

    async fn check_path(&self, path: &str, _rev: Revision) -> Result<NodeKind, BackendError> {
        self.begin(Operation::CheckPath)?;
        Ok(self.kind_of(path))
    }

    async fn get_dir(&self, path: &str, _rev: Revision) -> Result<Vec<DirEntry>, BackendError> {
        self.begin(Operation::GetDir)?;
        if self.kind_of(path) != NodeKind::Directory {
            return Err(BackendError::Protocol(format!("'{path}' is not a directory")));
        }
        Ok(self
            .backend
            .nodes
            .iter()
            .filter_map(|(p, node)| {
                let (parent, name) = split_parent(p);
                (parent == path).then(|| {
                    let kind = match node {
                        MemoryNode::Dir => NodeKind::Directory,
                        MemoryNode::File { .. } => NodeKind::File,
                    };
                    DirEntry::new(name, kind)
                })
            })
            .collect())
    }

    async fn get_file(&self, path: &str, _rev: Revision) -> Result<FileContent, BackendError> {
        self.begin(Operation::GetFile)?;
        match self.node(path) {
            Some(MemoryNode::File { bytes, date, rev }) => Ok(FileContent {
                bytes: bytes.clone(),
                committed_date: date.clone(),
                committed_rev: Some(*rev),
            }),
            _ => Err(BackendError::Protocol(format!("'{path}' is not a file"))),
        }
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.backend.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}
