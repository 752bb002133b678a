use std::sync::Arc;

use crate::request::IncomingRequest;
use crate::status::ReplyStatus;
use crate::types::CheckTuple;

/// Handler installed in an API set under a name.
///
/// `process` must lead to exactly one reply on `req`, either before
/// returning or later from a continuation holding its own clone of the `Arc`.
pub trait ApiHandler: Send + Sync {
    fn process(&self, req: &Arc<IncomingRequest>);
}

/// Asynchronous permission check.
///
/// `check` returns immediately. The oracle completes `on_complete` exactly
/// once, later, from any thread. The tuple is only borrowed for the duration
/// of the call; an oracle that finishes later copies what it needs.
pub trait PermissionOracle: Send + Sync {
    fn check(&self, tuple: &CheckTuple<'_>, on_complete: Completion);
}

type CompletionFn = Box<dyn FnOnce(ReplyStatus) + Send>;

/// One-shot continuation handed to a [`PermissionOracle`].
///
/// Completing consumes the value, so it cannot fire twice. Dropping it
/// without completing fires it with `INTERNAL_ERROR`, so the waiting side is
/// never left without a status.
pub struct Completion {
    callback: Option<CompletionFn>,
}

impl Completion {
    pub fn new(callback: impl FnOnce(ReplyStatus) + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// Delivers the oracle's status.
    pub fn complete(mut self, status: ReplyStatus) {
        if let Some(callback) = self.callback.take() {
            callback(status);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::error!("permission check dropped without completion");
            callback(ReplyStatus::INTERNAL_ERROR);
        }
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.callback.is_some())
            .finish()
    }
}
