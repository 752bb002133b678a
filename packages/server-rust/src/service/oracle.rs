//! Oracle adapters.
//!
//! [`PermissionOracle`] is callback-shaped. [`AsyncOracle`] lets an
//! `async fn` implementation be plugged in through [`SpawnedOracle`], which
//! runs each check as a tokio task and completes the continuation with its
//! result.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use permcheck_core::{CheckTuple, Completion, OwnedCheckTuple, PermissionOracle, ReplyStatus};
use tokio::runtime::Handle;

// ---------------------------------------------------------------------------
// AsyncOracle
// ---------------------------------------------------------------------------

/// Permission check written as an `async fn`.
#[async_trait]
pub trait AsyncOracle: Send + Sync + 'static {
    async fn check(&self, tuple: OwnedCheckTuple) -> ReplyStatus;
}

/// Drives an [`AsyncOracle`] on a tokio runtime.
pub struct SpawnedOracle<O> {
    inner: Arc<O>,
    runtime: Handle,
}

impl<O: AsyncOracle> SpawnedOracle<O> {
    #[must_use]
    pub fn new(inner: Arc<O>, runtime: Handle) -> Self {
        Self { inner, runtime }
    }

    /// Uses the runtime the caller is running on.
    ///
    /// # Errors
    ///
    /// Fails when called outside a tokio runtime.
    pub fn on_current_runtime(inner: Arc<O>) -> anyhow::Result<Self> {
        Ok(Self::new(inner, Handle::try_current()?))
    }
}

impl<O: AsyncOracle> PermissionOracle for SpawnedOracle<O> {
    fn check(&self, tuple: &CheckTuple<'_>, on_complete: Completion) {
        let inner = Arc::clone(&self.inner);
        let tuple = tuple.to_owned_tuple();
        // A panicking check drops `on_complete`, which then reports INTERNAL_ERROR.
        self.runtime.spawn(async move {
            let status = inner.check(tuple).await;
            on_complete.complete(status);
        });
    }
}

// ---------------------------------------------------------------------------
// StaticOracle
// ---------------------------------------------------------------------------

/// One granted (client, user, session, permission) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grant(pub OwnedCheckTuple);

#[derive(Debug, thiserror::Error)]
#[error("grant must be client:user:session:permission, got `{0}`")]
pub struct GrantParseError(String);

impl FromStr for Grant {
    type Err = GrantParseError;

    /// Parses `client:user:session:permission`. The permission keeps any
    /// further colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let mut next = || parts.next().ok_or_else(|| GrantParseError(s.to_string()));
        let client = next()?;
        let user = next()?;
        let session = next()?;
        let permission = next()?;
        Ok(Self(OwnedCheckTuple {
            client: client.to_string(),
            user: user.to_string(),
            session: session.to_string(),
            permission: permission.to_string(),
        }))
    }
}

/// Fixed list of grants: `OK` for an exact match, `FORBIDDEN` otherwise.
#[derive(Debug, Default)]
pub struct StaticOracle {
    grants: HashSet<OwnedCheckTuple>,
}

impl StaticOracle {
    #[must_use]
    pub fn new(grants: impl IntoIterator<Item = Grant>) -> Self {
        Self {
            grants: grants.into_iter().map(|g| g.0).collect(),
        }
    }
}

#[async_trait]
impl AsyncOracle for StaticOracle {
    async fn check(&self, tuple: OwnedCheckTuple) -> ReplyStatus {
        if self.grants.contains(&tuple) {
            ReplyStatus::OK
        } else {
            ReplyStatus::FORBIDDEN
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
