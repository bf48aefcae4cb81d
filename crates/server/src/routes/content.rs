use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    response::{IntoResponse, Response},
};
use svngate_core::{Gateway, RepositoryBackend, ResolvedPath, query};

use super::{RepoQuery, repo_request};
use crate::error::ApiErr;

/// GET /content: raw bytes of a repository file at head.
///
/// `length` carries the byte count and `date` the repository's committed
/// date for the file, passed through as the repository formats it. When the
/// repository reports no committed date the handler sets no `date` header,
/// so the only `Date` the caller sees is the one the HTTP server stamps on
/// every response (RFC 7231 format, server clock).
pub async fn content<B: RepositoryBackend>(
    State(gateway): State<Arc<Gateway<B>>>,
    query: Result<Query<RepoQuery>, QueryRejection>,
) -> Result<Response, ApiErr> {
    let req = repo_request(query)?;
    let session = gateway
        .open_session(&req.target_url, req.credentials)
        .await?;
    let path = ResolvedPath::resolve(&req.url, &req.target_url);

    let file = query::fetch(&session, &path).await?;
    drop(session);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(HeaderName::from_static("length"), HeaderValue::from(file.size()));
    match file.committed_date.as_deref().map(HeaderValue::from_str) {
        Some(Ok(date)) => {
            headers.insert(header::DATE, date);
        }
        Some(Err(_)) => tracing::warn!("committed date of {} is not a valid header value", req.url),
        None => tracing::debug!("no committed date reported for {}", req.url),
    }

    tracing::info!(
        committed_rev = ?file.committed_rev,
        "serving {} bytes from {}",
        file.size(),
        req.url
    );
    Ok((headers, file.bytes).into_response())
}
