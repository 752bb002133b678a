use parking_lot::Mutex;

use crate::status::ReplyStatus;
use crate::types::{Data, Param};

/// Receiver of the single reply of a request, supplied by the transport.
pub type ReplySink = Box<dyn FnOnce(ReplyStatus) + Send>;

/// A request addressed to an API, as handed over by the transport.
///
/// Requests are shared as `Arc<IncomingRequest>`: whoever needs the request
/// after the handler returns keeps a clone. The reply sink is consumed by the
/// first call to [`reply`](Self::reply); any later reply is refused.
pub struct IncomingRequest {
    api: String,
    verb: String,
    params: Vec<Param>,
    sink: Mutex<Option<ReplySink>>,
}

impl IncomingRequest {
    pub fn new(
        api: impl Into<String>,
        verb: impl Into<String>,
        params: Vec<Data>,
        sink: ReplySink,
    ) -> Self {
        Self {
            api: api.into(),
            verb: verb.into(),
            params: params.into_iter().map(Param::new).collect(),
            sink: Mutex::new(Some(sink)),
        }
    }

    #[must_use]
    pub fn api(&self) -> &str {
        &self.api
    }

    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Sends the reply. Returns `false` if a reply was already sent.
    pub fn reply(&self, status: ReplyStatus) -> bool {
        // Take the sink before calling it so the lock is not held by the transport.
        let sink = self.sink.lock().take();
        match sink {
            Some(sink) => {
                sink(status);
                true
            }
            None => {
                tracing::warn!(
                    api = %self.api,
                    verb = %self.verb,
                    status = %status,
                    "reply refused: request already answered"
                );
                false
            }
        }
    }

    /// Returns `true` once the reply has been sent.
    #[must_use]
    pub fn is_replied(&self) -> bool {
        self.sink.lock().is_none()
    }
}

impl std::fmt::Debug for IncomingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingRequest")
            .field("api", &self.api)
            .field("verb", &self.verb)
            .field("params", &self.params)
            .field("replied", &self.is_replied())
            .finish()
    }
}
