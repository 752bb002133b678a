use clap::Args;
use serde_json::{Map, Value};

/// Name the extension reports itself under.
pub const EXTENSION_NAME: &str = "PERM-CHECK";

pub const DEFAULT_API_NAME: &str = "perm";
pub const DEFAULT_VERB_NAME: &str = "check";

pub const KEY_API: &str = "perm-check-api";
pub const KEY_VERB: &str = "perm-check-verb";
pub const KEY_SCOPE: &str = "perm-check-scope";
pub const KEY_DISABLED: &str = "perm-check-disabled";

/// Effective endpoint settings, resolved once at startup.
///
/// Immutable after construction; share it as `Arc<EndpointConfig>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// API name the endpoint is declared under.
    pub api: String,
    /// The single verb the endpoint answers.
    pub verb: String,
    /// Name of the API subset to declare into. `None` means the top-level set.
    pub scope: Option<String>,
    /// When false, nothing is declared.
    pub enabled: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            api: DEFAULT_API_NAME.to_string(),
            verb: DEFAULT_VERB_NAME.to_string(),
            scope: None,
            enabled: true,
        }
    }
}

impl EndpointConfig {
    /// Resolves the endpoint settings from a configuration document.
    ///
    /// Missing keys keep their defaults and unknown keys are ignored. A
    /// missing document, or one that is not an object, yields the defaults.
    #[must_use]
    pub fn from_document(document: Option<&Value>) -> Self {
        let shown = document.map_or_else(|| "null".to_string(), ToString::to_string);
        tracing::info!(
            extension = EXTENSION_NAME,
            config = %shown,
            "extension got config"
        );

        let mut config = Self::default();
        let Some(Value::Object(doc)) = document else {
            return config;
        };

        if let Some(api) = string_entry(doc, KEY_API) {
            config.api = api;
        }
        if let Some(verb) = string_entry(doc, KEY_VERB) {
            config.verb = verb;
        }
        if let Some(scope) = string_entry(doc, KEY_SCOPE) {
            config.scope = Some(scope);
        }
        config.enabled = !doc.get(KEY_DISABLED).is_some_and(is_truthy);
        config
    }

    /// Scope label used in log lines.
    #[must_use]
    pub fn scope_label(&self) -> &str {
        self.scope.as_deref().unwrap_or("(default)")
    }
}

/// String value of `key`. Non-string values are taken in their JSON text form;
/// `null` counts as absent.
fn string_entry(doc: &Map<String, Value>, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Command-line options
// ---------------------------------------------------------------------------

/// Command-line options of the extension.
///
/// Rendered with [`to_document`](Self::to_document) so that they go through
/// the same resolver as file-based configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ExtensionOptions {
    /// Set the API name (default perm)
    #[arg(long = "perm-check-api", id = "perm-check-api", value_name = "NAME")]
    pub api: Option<String>,

    /// Set the VERB name (default check)
    #[arg(long = "perm-check-verb", id = "perm-check-verb", value_name = "NAME")]
    pub verb: Option<String>,

    /// Set scope of the declared API
    #[arg(long = "perm-check-scope", id = "perm-check-scope", value_name = "NAME")]
    pub scope: Option<String>,

    /// Disable the extension
    #[arg(long = "perm-check-disabled", id = "perm-check-disabled")]
    pub disabled: bool,
}

impl ExtensionOptions {
    /// Configuration document holding only the options actually given.
    #[must_use]
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(api) = &self.api {
            doc.insert(KEY_API.to_string(), Value::String(api.clone()));
        }
        if let Some(verb) = &self.verb {
            doc.insert(KEY_VERB.to_string(), Value::String(verb.clone()));
        }
        if let Some(scope) = &self.scope {
            doc.insert(KEY_SCOPE.to_string(), Value::String(scope.clone()));
        }
        if self.disabled {
            doc.insert(KEY_DISABLED.to_string(), Value::Bool(true));
        }
        Value::Object(doc)
    }
}

/// Overlays the entries of `overlay` on `base`. Non-object inputs are treated as empty.
#[must_use]
pub fn merge_documents(base: Option<Value>, overlay: &Value) -> Value {
    let mut merged = match base {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    if let Value::Object(entries) = overlay {
        for (key, value) in entries {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
