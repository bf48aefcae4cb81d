//! Session establishment.

use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::error::{GatewayError, Result};
use crate::location::{Credentials, RepositoryLocation};
use crate::repo::RepositoryBackend;

/// URL schemes the gateway can open sessions for.
///
/// Filled once at startup by [`Gateway::new`]; read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SchemeRegistry {
    schemes: BTreeSet<String>,
}

impl SchemeRegistry {
    /// Register `scheme`. Returns `false` if it was already present.
    pub fn register(&mut self, scheme: &str) -> bool {
        self.schemes.insert(scheme.to_ascii_lowercase())
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.schemes.contains(&scheme.to_ascii_lowercase())
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }
}

/// A backend together with the schemes it was registered for.
///
/// Holds no per-request state; shared across requests behind an `Arc`.
pub struct Gateway<B> {
    backend: B,
    registry: SchemeRegistry,
}

impl<B: RepositoryBackend> Gateway<B> {
    /// Build the gateway and run the backend's scheme registration.
    pub fn new(backend: B) -> Self {
        let mut registry = SchemeRegistry::default();
        backend.register_schemes(&mut registry);
        Self { backend, registry }
    }

    pub fn registry(&self) -> &SchemeRegistry {
        &self.registry
    }

    /// Open a session on `target_url` with `credentials`.
    ///
    /// Only the URL is validated here. Authentication is checked lazily by
    /// the first remote call on the returned session.
    pub async fn open_session(
        &self,
        target_url: &str,
        credentials: Credentials,
    ) -> Result<B::Session> {
        let location = RepositoryLocation::parse(target_url).inspect_err(|e| {
            error!("can't parse repository URL {target_url}: {e}");
        })?;

        if !self.registry.supports(location.scheme()) {
            error!(
                "no backend registered for scheme '{}' ({target_url})",
                location.scheme()
            );
            return Err(GatewayError::unreachable(
                target_url,
                format!("unsupported scheme '{}'", location.scheme()),
            ));
        }

        let session = self
            .backend
            .open(location, credentials)
            .await
            .map_err(|e| {
                error!("can't open repository session for {target_url}: {e}");
                GatewayError::unreachable(target_url, e)
            })?;

        debug!("opened repository session for {target_url}");
        Ok(session)
    }
}
