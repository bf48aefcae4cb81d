use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::header,
    response::{IntoResponse, Response},
};
use svngate_core::{Gateway, RepositoryBackend, ResolvedPath, query};

use super::{RepoQuery, repo_request};
use crate::error::ApiErr;

/// GET /list: immediate children of a repository directory.
///
/// Body is `"<name> <kind> <name> <kind> ..."` in the order the repository
/// returned them.
pub async fn list<B: RepositoryBackend>(
    State(gateway): State<Arc<Gateway<B>>>,
    query: Result<Query<RepoQuery>, QueryRejection>,
) -> Result<Response, ApiErr> {
    let req = repo_request(query)?;
    let session = gateway
        .open_session(&req.target_url, req.credentials)
        .await?;
    let path = ResolvedPath::resolve(&req.url, &req.target_url);

    let listing = query::list(&session, &path).await?;
    drop(session);

    tracing::info!("listed {} entries under {}", listing.len(), req.url);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        listing.render(),
    )
        .into_response())
}
