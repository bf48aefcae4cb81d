pub mod content;
pub mod health;
pub mod list;

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, rejection::QueryRejection},
    routing::get,
};
use serde::Deserialize;
use svngate_core::{Credentials, Gateway, RepositoryBackend};

use crate::error::ApiErr;

/// Route table. Both repository routes share the one gateway.
pub fn router<B: RepositoryBackend>(gateway: Arc<Gateway<B>>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/list", get(list::list::<B>))
        .route("/content", get(content::content::<B>))
        .with_state(gateway)
}

/// Raw query string of `/list` and `/content`.
///
/// Fields are optional here so a missing one can be reported by name.
/// Malformed and incomplete query strings are answered like any other failed
/// request: 500 with the message as the body.
#[derive(Debug, Default, Deserialize)]
pub struct RepoQuery {
    #[serde(rename = "targetUrl")]
    pub target_url: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// A validated repository request.
#[derive(Debug)]
pub struct RepoRequest {
    pub target_url: String,
    pub url: String,
    pub credentials: Credentials,
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiErr> {
    value.ok_or_else(|| ApiErr::internal(format!("missing required parameter '{field}'")))
}

/// Unpack the extractor result and validate it.
pub fn repo_request(
    query: Result<Query<RepoQuery>, QueryRejection>,
) -> Result<RepoRequest, ApiErr> {
    let Query(params) = query.map_err(|rejection| {
        let message = rejection.body_text();
        tracing::warn!("rejected query string: {message}");
        ApiErr::internal(message)
    })?;
    params.into_request()
}

impl RepoQuery {
    /// All four parameters must be present; `name` and `password` may be
    /// empty, which means anonymous access.
    pub fn into_request(self) -> Result<RepoRequest, ApiErr> {
        let target_url = required(self.target_url, "targetUrl")?;
        let url = required(self.url, "url")?;
        let name = required(self.name, "name")?;
        let password = required(self.password, "password")?;
        Ok(RepoRequest {
            target_url,
            url,
            credentials: Credentials::new(name, password),
        })
    }
}
