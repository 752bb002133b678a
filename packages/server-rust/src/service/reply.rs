use std::sync::Arc;

use permcheck_core::{Data, IncomingRequest, ReplyStatus};
use tokio::sync::oneshot;

/// Builds a request whose reply is delivered on a oneshot channel.
///
/// The receiver yields exactly one status, or an error if the request was
/// dropped without being answered.
#[must_use]
pub fn request_with_reply(
    api: impl Into<String>,
    verb: impl Into<String>,
    params: Vec<Data>,
) -> (Arc<IncomingRequest>, oneshot::Receiver<ReplyStatus>) {
    let (tx, rx) = oneshot::channel();
    let req = IncomingRequest::new(
        api,
        verb,
        params,
        Box::new(move |status| {
            // The caller may have stopped waiting.
            let _ = tx.send(status);
        }),
    );
    (Arc::new(req), rx)
}
