use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use permcheck_core::{ApiHandler, IncomingRequest, ReplyStatus};

/// Characters an API name may not contain, besides whitespace and controls.
const FORBIDDEN_NAME_CHARS: &[char] = &['"', '#', '%', '&', '\'', '/', '?', '`', '\\'];

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid API name `{name}`")]
    InvalidName { name: String },
    #[error("API name `{name}` is reserved")]
    Reserved { name: String },
    #[error("API `{name}` already exists in set `{set}`")]
    AlreadyExists { name: String, set: String },
}

// ---------------------------------------------------------------------------
// ApiSet
// ---------------------------------------------------------------------------

/// Named set of API handlers.
///
/// A set may own named subsets. Lookups fall through to the subsets, so an
/// API declared in a subset is reachable from its parent but not the other
/// way around. Sets are shared as `Arc<ApiSet>`; holding the `Arc` keeps the
/// set alive.
pub struct ApiSet {
    name: String,
    /// API name -> handler.
    apis: DashMap<String, Arc<dyn ApiHandler>>,
    /// Subsets, searched in insertion order.
    subsets: RwLock<Vec<Arc<ApiSet>>>,
    /// Names no handler may be declared under.
    reserved: RwLock<HashSet<String>>,
}

impl ApiSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            apis: DashMap::new(),
            subsets: RwLock::new(Vec::new()),
            reserved: RwLock::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attaches `subset` below this set.
    pub fn add_subset(&self, subset: Arc<ApiSet>) {
        self.subsets.write().push(subset);
    }

    /// Finds the set called `name`: this set itself, or any subset below it.
    #[must_use]
    pub fn subset_find(self: &Arc<Self>, name: &str) -> Option<Arc<ApiSet>> {
        if self.name == name {
            return Some(self.clone());
        }
        self.subsets
            .read()
            .iter()
            .find_map(|subset| subset.subset_find(name))
    }

    /// Marks `name` as unusable for handlers of this set.
    pub fn reserve(&self, name: impl Into<String>) {
        self.reserved.write().insert(name.into());
    }

    /// Checks that `name` can be used to declare an API in this set.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidName` for malformed names and
    /// `RegistryError::Reserved` for reserved ones.
    pub fn check_api_name(&self, name: &str) -> Result<(), RegistryError> {
        let malformed = name.is_empty()
            || name
                .chars()
                .any(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_NAME_CHARS.contains(&c));
        if malformed {
            return Err(RegistryError::InvalidName {
                name: name.to_string(),
            });
        }
        if self.reserved.read().contains(name) {
            return Err(RegistryError::Reserved {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Declares `handler` under `name`.
    ///
    /// # Errors
    ///
    /// Fails if the name is invalid, reserved, or already declared in this set.
    pub fn add(&self, name: &str, handler: Arc<dyn ApiHandler>) -> Result<(), RegistryError> {
        self.check_api_name(name)?;
        match self.apis.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists {
                name: name.to_string(),
                set: self.name.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                Ok(())
            }
        }
    }

    /// Looks `name` up in this set, then in the subsets.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ApiHandler>> {
        if let Some(entry) = self.apis.get(name) {
            return Some(entry.value().clone());
        }
        self.subsets.read().iter().find_map(|subset| subset.get(name))
    }

    /// Names declared directly in this set, sorted.
    #[must_use]
    pub fn api_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.apis.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Routes `req` to the handler of its API. Unknown APIs are answered
    /// with `UNKNOWN_API`.
    pub fn call(&self, req: &Arc<IncomingRequest>) {
        let _span = tracing::debug_span!("api_call", api = req.api(), verb = req.verb()).entered();
        match self.get(req.api()) {
            Some(handler) => handler.process(req),
            None => {
                tracing::debug!(api = req.api(), set = %self.name, "unknown api");
                req.reply(ReplyStatus::UNKNOWN_API);
            }
        }
    }
}

impl std::fmt::Debug for ApiSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSet")
            .field("name", &self.name)
            .field("apis", &self.api_names())
            .field(
                "subsets",
                &self.subsets.read().iter().map(|s| s.name.clone()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    /// Handler that answers every request with a fixed status.
    struct FixedHandler(ReplyStatus);

    impl ApiHandler for FixedHandler {
        fn process(&self, req: &Arc<IncomingRequest>) {
            req.reply(self.0);
        }
    }

    fn request(api: &str, log: Arc<Mutex<Vec<ReplyStatus>>>) -> Arc<IncomingRequest> {
        Arc::new(IncomingRequest::new(
            api,
            "verb",
            Vec::new(),
            Box::new(move |s| log.lock().push(s)),
        ))
    }

    #[test]
    fn add_and_get_by_name() {
        let set = ApiSet::new("root");
        set.add("perm", Arc::new(FixedHandler(ReplyStatus::OK))).unwrap();
        assert!(set.get("perm").is_some());
        assert!(set.get("other").is_none());
        assert_eq!(set.api_names(), vec!["perm"]);
    }

    #[test]
    fn duplicate_name_is_refused() {
        let set = ApiSet::new("root");
        set.add("perm", Arc::new(FixedHandler(ReplyStatus::OK))).unwrap();
        let err = set
            .add("perm", Arc::new(FixedHandler(ReplyStatus::OK)))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyExists {
                name: "perm".into(),
                set: "root".into()
            }
        );
    }

    #[test]
    fn malformed_names_are_invalid() {
        let set = ApiSet::new("root");
        for name in ["", "a b", "a/b", "x?", "tab\there"] {
            assert!(
                matches!(set.check_api_name(name), Err(RegistryError::InvalidName { .. })),
                "{name:?} should be invalid"
            );
        }
        assert!(set.check_api_name("perm-check.v2").is_ok());
    }

    #[test]
    fn reserved_names_are_refused() {
        let set = ApiSet::new("root");
        set.reserve("monitor");
        assert!(matches!(
            set.add("monitor", Arc::new(FixedHandler(ReplyStatus::OK))),
            Err(RegistryError::Reserved { .. })
        ));
    }

    #[test]
    fn subset_find_searches_self_and_descendants() {
        let root = Arc::new(ApiSet::new("root"));
        let private = Arc::new(ApiSet::new("private"));
        let inner = Arc::new(ApiSet::new("inner"));
        private.add_subset(inner);
        root.add_subset(private);

        assert_eq!(root.subset_find("root").unwrap().name(), "root");
        assert_eq!(root.subset_find("private").unwrap().name(), "private");
        assert_eq!(root.subset_find("inner").unwrap().name(), "inner");
        assert!(root.subset_find("missing").is_none());
    }

    #[test]
    fn lookups_fall_through_to_subsets() {
        let root = Arc::new(ApiSet::new("root"));
        let private = Arc::new(ApiSet::new("private"));
        root.add_subset(private.clone());
        private
            .add("perm", Arc::new(FixedHandler(ReplyStatus::OK)))
            .unwrap();

        assert!(root.get("perm").is_some());
        assert!(root.api_names().is_empty());
    }

    #[test]
    fn call_routes_to_handler() {
        let set = ApiSet::new("root");
        set.add("perm", Arc::new(FixedHandler(ReplyStatus::FORBIDDEN)))
            .unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        set.call(&request("perm", log.clone()));
        assert_eq!(*log.lock(), vec![ReplyStatus::FORBIDDEN]);
    }

    #[test]
    fn call_unknown_api_replies_unknown_api() {
        let set = ApiSet::new("root");
        let log = Arc::new(Mutex::new(Vec::new()));
        set.call(&request("nope", log.clone()));
        assert_eq!(*log.lock(), vec![ReplyStatus::UNKNOWN_API]);
    }
}
