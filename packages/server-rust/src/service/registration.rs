//! Declares the permission-check endpoint into an [`ApiSet`].

use std::sync::Arc;

use permcheck_core::PermissionOracle;

use super::config::{EndpointConfig, EXTENSION_NAME};
use super::dispatcher::PermCheckApi;
use super::registry::{ApiSet, RegistryError};

/// Startup failures. All of them are fatal: the endpoint must not serve.
#[derive(Debug, thiserror::Error)]
pub enum DeclareError {
    #[error("can't use API {api} in extension PERM-CHECK: {source}")]
    ApiUnavailable {
        api: String,
        #[source]
        source: RegistryError,
    },
    #[error("invalid scope {scope} in extension PERM-CHECK")]
    InvalidScope { scope: String },
    #[error("extension PERM-CHECK failed to register: {0}")]
    Registry(#[source] RegistryError),
}

/// A declared endpoint. Keeps the API set it was declared into alive.
#[derive(Debug)]
pub struct Registration {
    api: String,
    set: Arc<ApiSet>,
}

impl Registration {
    #[must_use]
    pub fn api(&self) -> &str {
        &self.api
    }

    /// The set the endpoint was declared into.
    #[must_use]
    pub fn api_set(&self) -> &Arc<ApiSet> {
        &self.set
    }
}

/// Declares the endpoint described by `config` into `declare_set`, or into
/// its subset named by `config.scope`.
///
/// Returns `Ok(None)` when the endpoint is disabled.
///
/// # Errors
///
/// - `DeclareError::ApiUnavailable` if the API name is invalid or reserved
/// - `DeclareError::InvalidScope` if the scope names no subset
/// - `DeclareError::Registry` if the set refuses the handler
pub fn declare(
    config: &Arc<EndpointConfig>,
    declare_set: &Arc<ApiSet>,
    oracle: Arc<dyn PermissionOracle>,
) -> Result<Option<Registration>, DeclareError> {
    if !config.enabled {
        tracing::info!(extension = EXTENSION_NAME, "extension is disabled");
        return Ok(None);
    }

    tracing::info!(
        extension = EXTENSION_NAME,
        api = %config.api,
        verb = %config.verb,
        scope = config.scope_label(),
        "registering extension"
    );

    declare_set
        .check_api_name(&config.api)
        .map_err(|source| DeclareError::ApiUnavailable {
            api: config.api.clone(),
            source,
        })
        .inspect_err(|e| tracing::error!(error = %e, "api name unavailable"))?;

    let set = match &config.scope {
        None => Arc::clone(declare_set),
        Some(scope) => declare_set.subset_find(scope).ok_or_else(|| {
            let e = DeclareError::InvalidScope {
                scope: scope.clone(),
            };
            tracing::error!(error = %e, "scope not found");
            e
        })?,
    };

    let handler = Arc::new(PermCheckApi::new(Arc::clone(config), oracle));
    set.add(&config.api, handler)
        .map_err(DeclareError::Registry)
        .inspect_err(|e| tracing::error!(error = %e, "registration failed"))?;

    Ok(Some(Registration {
        api: config.api.clone(),
        set,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
