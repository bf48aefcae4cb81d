//! Repository Query Engine: classify a resolved path, then list or fetch it.
//!
//! Every call is a single attempt. A remote failure becomes
//! [`GatewayError::BackendOperationFailed`] and is never retried.

use tracing::{debug, error, warn};

use crate::error::{BackendError, GatewayError, Operation, Result};
use crate::repo::{DirectoryListing, FileContent, NodeKind, RepositorySession, Revision};
use crate::resolve::ResolvedPath;

fn backend_failed(op: Operation, path: &ResolvedPath, source: BackendError) -> GatewayError {
    error!("{op} failed for {} (path '{path}'): {source}", path.url());
    GatewayError::BackendOperationFailed {
        op,
        url: path.url().to_string(),
        source,
    }
}

/// Kind of the node at `path` in the latest revision.
pub async fn classify<S: RepositorySession>(session: &S, path: &ResolvedPath) -> Result<NodeKind> {
    let kind = session
        .check_path(path.as_str(), Revision::HEAD)
        .await
        .map_err(|e| backend_failed(Operation::CheckPath, path, e))?;
    debug!("classified '{path}' in {} as {kind}", session.location());
    Ok(kind)
}

/// Immediate children of the directory at `path`.
pub async fn list<S: RepositorySession>(
    session: &S,
    path: &ResolvedPath,
) -> Result<DirectoryListing> {
    let kind = classify(session, path).await?;
    if kind != NodeKind::Directory {
        warn!("{} is {kind}, not a directory", path.url());
        return Err(GatewayError::NotADirectory {
            url: path.url().to_string(),
        });
    }

    let entries = session
        .get_dir(path.as_str(), Revision::HEAD)
        .await
        .map_err(|e| backend_failed(Operation::GetDir, path, e))?;
    Ok(DirectoryListing::new(entries))
}

/// Whole contents of the file at `path`.
pub async fn fetch<S: RepositorySession>(session: &S, path: &ResolvedPath) -> Result<FileContent> {
    let kind = classify(session, path).await?;
    if kind != NodeKind::File {
        warn!("{} is {kind}, not a file", path.url());
        return Err(GatewayError::NotAFile {
            url: path.url().to_string(),
        });
    }

    let content = session
        .get_file(path.as_str(), Revision::HEAD)
        .await
        .map_err(|e| backend_failed(Operation::GetFile, path, e))?;
    debug!("fetched {} bytes from '{path}'", content.size());
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Credentials;
    use crate::session::Gateway;
    use crate::testing::MemoryBackend;

    const TARGET: &str = "https://svn.example.com/repo";

    fn sample_backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_dir("trunk")
            .with_dir("trunk/src")
            .with_file("trunk/src/main.c", b"int main(void) { return 0; }\n")
            .with_dir("trunk/src/lib")
            .with_file("trunk/README.md", &[b'x'; 42])
    }

    fn at(suffix: &str) -> ResolvedPath {
        ResolvedPath::resolve(&format!("{TARGET}/{suffix}"), TARGET)
    }

    #[tokio::test]
    async fn classify_reports_each_kind() {
        let gateway = Gateway::new(sample_backend());
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        assert_eq!(classify(&session, &at("trunk")).await.unwrap(), NodeKind::Directory);
        assert_eq!(classify(&session, &at("trunk/README.md")).await.unwrap(), NodeKind::File);
        assert_eq!(classify(&session, &at("nope")).await.unwrap(), NodeKind::Missing);
        assert_eq!(
            classify(&session, &ResolvedPath::resolve(TARGET, TARGET)).await.unwrap(),
            NodeKind::Directory
        );
    }

    #[tokio::test]
    async fn list_returns_immediate_children_in_backend_order() {
        let gateway = Gateway::new(sample_backend());
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        let listing = list(&session, &at("trunk/src")).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.render(), "main.c file lib dir");

        let root = list(&session, &ResolvedPath::resolve(TARGET, TARGET)).await.unwrap();
        assert_eq!(root.render(), "trunk dir");
    }

    #[tokio::test]
    async fn list_of_n_children_renders_n_pairs() {
        let mut backend = MemoryBackend::new().with_dir("many");
        for i in 0..7 {
            backend = backend.with_file(&format!("many/f{i}.txt"), b"");
        }
        let gateway = Gateway::new(backend);
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        let rendered = list(&session, &at("many")).await.unwrap().render();
        assert_eq!(rendered.split(' ').count(), 14);
        assert_eq!(rendered, rendered.trim());
    }

    #[tokio::test]
    async fn list_rejects_missing_and_file_paths() {
        let gateway = Gateway::new(sample_backend());
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        let missing = list(&session, &at("nope")).await.unwrap_err();
        assert!(matches!(missing, GatewayError::NotADirectory { .. }));
        assert!(missing.to_string().contains("/repo/nope"));

        let file = list(&session, &at("trunk/README.md")).await.unwrap_err();
        assert!(matches!(file, GatewayError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn fetch_returns_whole_file_with_date() {
        let gateway = Gateway::new(sample_backend());
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        let content = fetch(&session, &at("trunk/README.md")).await.unwrap();
        assert_eq!(content.size(), 42);
        assert_eq!(content.bytes, vec![b'x'; 42]);
        assert!(content.committed_date.is_some());
    }

    #[tokio::test]
    async fn fetch_rejects_directories_and_missing_paths() {
        let gateway = Gateway::new(sample_backend());
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        let dir = fetch(&session, &at("trunk/src")).await.unwrap_err();
        assert!(matches!(dir, GatewayError::NotAFile { .. }));

        let missing = fetch(&session, &at("nope.txt")).await.unwrap_err();
        assert!(matches!(missing, GatewayError::NotAFile { .. }));
    }

    #[tokio::test]
    async fn rejected_credentials_surface_on_first_call() {
        let gateway = Gateway::new(sample_backend().with_credentials("alice", "secret"));
        let session = gateway
            .open_session(TARGET, Credentials::new("alice", "wrong"))
            .await
            .unwrap();

        let err = list(&session, &at("trunk")).await.unwrap_err();
        match err {
            GatewayError::BackendOperationFailed { op, source, .. } => {
                assert_eq!(op, Operation::CheckPath);
                assert!(matches!(source, BackendError::Unauthorized));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failing_remote_call_is_not_retried() {
        let backend = sample_backend().failing(Operation::GetDir);
        let stats = backend.stats();
        let gateway = Gateway::new(backend);
        let session = gateway
            .open_session(TARGET, Credentials::anonymous())
            .await
            .unwrap();

        let err = list(&session, &at("trunk")).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::BackendOperationFailed {
                op: Operation::GetDir,
                ..
            }
        ));
        assert_eq!(stats.calls(), 2);
    }
}
