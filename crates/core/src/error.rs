use std::fmt;

/// Failure raised by a repository backend while talking to the remote server.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("authentication rejected by repository")]
    Unauthorized,

    #[error("access to path forbidden")]
    Forbidden,

    #[error("repository answered with HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl BackendError {
    /// Wrap any transport-level error into [`BackendError::Transport`].
    pub fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(e))
    }
}

/// Remote operation that failed, named after the repository protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CheckPath,
    GetDir,
    GetFile,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckPath => "check-path",
            Self::GetDir => "get-dir",
            Self::GetFile => "get-file",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a gateway request can fail with.
///
/// The HTTP layer collapses all of these into one status; the variants exist
/// so callers can tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("can't find repository for {url}: {reason}")]
    RepositoryUnreachable { url: String, reason: String },

    #[error("{url} is not a directory, can't get file list")]
    NotADirectory { url: String },

    #[error("{url} is not a file")]
    NotAFile { url: String },

    #[error("{op} {url} failed: {source}")]
    BackendOperationFailed {
        op: Operation,
        url: String,
        #[source]
        source: BackendError,
    },
}

impl GatewayError {
    pub fn unreachable(url: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::RepositoryUnreachable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable tag, used for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RepositoryUnreachable { .. } => "repository_unreachable",
            Self::NotADirectory { .. } => "not_a_directory",
            Self::NotAFile { .. } => "not_a_file",
            Self::BackendOperationFailed { .. } => "backend_operation_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
