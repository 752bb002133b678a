//! The permission-check endpoint.
//!
//! Each request ends in exactly one reply, reached from one of three branches:
//!
//! 1. verb mismatch -> `UNKNOWN_VERB`, parameters not inspected;
//! 2. extraction failure -> `INVALID_REQUEST`, oracle not called;
//! 3. oracle dispatch -> the [`Completion`] replies with the normalized status.
//!
//! On branch 3 the completion owns a clone of the request `Arc`, released
//! right after the reply.

use std::sync::Arc;

use permcheck_core::{ApiHandler, Completion, IncomingRequest, PermissionOracle, ReplyStatus};

use super::config::EndpointConfig;
use super::extract::extract_values;
use super::status::normalize;

/// Handler answering the configured verb by asking the oracle.
pub struct PermCheckApi {
    config: Arc<EndpointConfig>,
    oracle: Arc<dyn PermissionOracle>,
}

impl PermCheckApi {
    #[must_use]
    pub fn new(config: Arc<EndpointConfig>, oracle: Arc<dyn PermissionOracle>) -> Self {
        Self { config, oracle }
    }

    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }
}

impl ApiHandler for PermCheckApi {
    fn process(&self, req: &Arc<IncomingRequest>) {
        if req.verb() != self.config.verb {
            tracing::debug!(api = req.api(), verb = req.verb(), "unknown verb");
            req.reply(ReplyStatus::UNKNOWN_VERB);
            return;
        }

        let tuple = match extract_values(req.params()) {
            Ok(tuple) => tuple,
            Err(e) => {
                tracing::debug!(error = %e, "invalid perm-check request");
                req.reply(ReplyStatus::INVALID_REQUEST);
                return;
            }
        };

        tracing::debug!(
            client = tuple.client,
            user = tuple.user,
            session = tuple.session,
            permission = tuple.permission,
            "perm-check"
        );

        let pending = Arc::clone(req);
        let completion = Completion::new(move |status| {
            tracing::debug!(status = %status, "perm-check result");
            pending.reply(normalize(status));
        });
        self.oracle.check(&tuple, completion);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use permcheck_core::{CheckTuple, Data, OwnedCheckTuple};
    use serde_json::json;

    use super::*;

    /// Oracle that records every tuple and parks the completion for the test.
    #[derive(Default)]
    struct ParkingOracle {
        calls: Mutex<Vec<OwnedCheckTuple>>,
        parked: Mutex<Vec<Completion>>,
    }

    impl ParkingOracle {
        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }

        fn complete_next(&self, status: ReplyStatus) {
            let completion = self.parked.lock().remove(0);
            completion.complete(status);
        }
    }

    impl PermissionOracle for ParkingOracle {
        fn check(&self, tuple: &CheckTuple<'_>, on_complete: Completion) {
            self.calls.lock().push(tuple.to_owned_tuple());
            self.parked.lock().push(on_complete);
        }
    }

    fn setup() -> (PermCheckApi, Arc<ParkingOracle>) {
        let oracle = Arc::new(ParkingOracle::default());
        let api = PermCheckApi::new(Arc::new(EndpointConfig::default()), oracle.clone());
        (api, oracle)
    }

    fn request(verb: &str, params: Vec<Data>) -> (Arc<IncomingRequest>, Arc<Mutex<Vec<ReplyStatus>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let req = IncomingRequest::new("perm", verb, params, Box::new(move |s| sink.lock().push(s)));
        (Arc::new(req), log)
    }

    fn four(c: &str, u: &str, s: &str, p: &str) -> Vec<Data> {
        vec![Data::from(c), Data::from(u), Data::from(s), Data::from(p)]
    }

    #[test]
    fn wrong_verb_replies_unknown_verb_without_oracle() {
        let (api, oracle) = setup();
        let (req, log) = request("list", four("c1", "u1", "s1", "perm.read"));
        api.process(&req);
        assert_eq!(*log.lock(), vec![ReplyStatus::UNKNOWN_VERB]);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn wrong_verb_does_not_inspect_parameters() {
        let (api, _oracle) = setup();
        let (req, log) = request("list", vec![Data::Json("{broken".into())]);
        api.process(&req);
        assert_eq!(*log.lock(), vec![ReplyStatus::UNKNOWN_VERB]);
        assert!(matches!(
            req.params()[0].data(),
            Data::Json(_)
        ));
    }

    #[test]
    fn bad_parameters_reply_invalid_request_without_oracle() {
        let (api, oracle) = setup();
        let (req, log) = request("check", vec![Data::from("c"), Data::from("u"), Data::from("s")]);
        api.process(&req);
        assert_eq!(*log.lock(), vec![ReplyStatus::INVALID_REQUEST]);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn missing_permission_key_replies_invalid_request() {
        let (api, oracle) = setup();
        let doc = json!({ "client": "c1", "user": "u1", "session": "s1" });
        let (req, log) = request("check", vec![Data::from(doc)]);
        api.process(&req);
        assert_eq!(*log.lock(), vec![ReplyStatus::INVALID_REQUEST]);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn positional_request_reaches_oracle_and_replies_once() {
        let (api, oracle) = setup();
        let (req, log) = request("check", four("c1", "u1", "s1", "perm.read"));
        api.process(&req);

        assert!(log.lock().is_empty(), "no reply before the oracle completes");
        assert_eq!(
            oracle.calls.lock()[0],
            OwnedCheckTuple {
                client: "c1".into(),
                user: "u1".into(),
                session: "s1".into(),
                permission: "perm.read".into(),
            }
        );

        oracle.complete_next(ReplyStatus::OK);
        assert_eq!(*log.lock(), vec![ReplyStatus::OK]);
    }

    #[test]
    fn structured_request_reaches_oracle() {
        let (api, oracle) = setup();
        let doc = json!({ "client": "c", "user": "u", "session": "s", "permission": "p", "x": 1 });
        let (req, log) = request("check", vec![Data::from(doc)]);
        api.process(&req);
        assert_eq!(oracle.calls.lock()[0].permission, "p");
        oracle.complete_next(ReplyStatus::FORBIDDEN);
        assert_eq!(*log.lock(), vec![ReplyStatus::FORBIDDEN]);
    }

    #[test]
    fn unknown_api_from_oracle_becomes_not_available() {
        let (api, oracle) = setup();
        let (req, log) = request("check", four("c", "u", "s", "p"));
        api.process(&req);
        oracle.complete_next(ReplyStatus::UNKNOWN_API);
        assert_eq!(*log.lock(), vec![ReplyStatus::NOT_AVAILABLE]);
    }

    #[test]
    fn reference_count_returns_after_reply() {
        let (api, oracle) = setup();
        let (req, _log) = request("check", four("c", "u", "s", "p"));
        let before = Arc::strong_count(&req);

        api.process(&req);
        assert_eq!(Arc::strong_count(&req), before + 1);

        oracle.complete_next(ReplyStatus::OK);
        assert_eq!(Arc::strong_count(&req), before);
    }

    #[test]
    fn early_replies_take_no_extra_reference() {
        let (api, _oracle) = setup();
        let (req, _log) = request("nope", Vec::new());
        let before = Arc::strong_count(&req);
        api.process(&req);
        assert_eq!(Arc::strong_count(&req), before);
    }

    #[test]
    fn exactly_one_reply_for_any_status() {
        for code in [0, 1, -1, -3, -5, -8, -12, 1234, i32::MIN] {
            let (api, oracle) = setup();
            let (req, log) = request("check", four("c", "u", "s", "p"));
            api.process(&req);
            oracle.complete_next(ReplyStatus(code));
            assert_eq!(log.lock().len(), 1, "status {code}");
            assert!(req.is_replied());
        }
    }

    #[test]
    fn dropped_completion_still_replies_once() {
        let (api, oracle) = setup();
        let (req, log) = request("check", four("c", "u", "s", "p"));
        api.process(&req);
        oracle.parked.lock().clear();
        assert_eq!(*log.lock(), vec![ReplyStatus::INTERNAL_ERROR]);
    }

    #[test]
    fn configured_verb_is_honoured() {
        let oracle = Arc::new(ParkingOracle::default());
        let config = EndpointConfig {
            verb: "has".into(),
            ..EndpointConfig::default()
        };
        let api = PermCheckApi::new(Arc::new(config), oracle.clone());

        let (req, log) = request("check", four("c", "u", "s", "p"));
        api.process(&req);
        assert_eq!(*log.lock(), vec![ReplyStatus::UNKNOWN_VERB]);

        let (req, _log) = request("has", four("c", "u", "s", "p"));
        api.process(&req);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn completion_from_another_task_replies() {
        let (api, oracle) = setup();
        let (req, log) = request("check", four("c", "u", "s", "p"));
        api.process(&req);

        let completion = oracle.parked.lock().remove(0);
        tokio::spawn(async move { completion.complete(ReplyStatus::OK) })
            .await
            .unwrap();
        assert_eq!(*log.lock(), vec![ReplyStatus::OK]);
    }
}
