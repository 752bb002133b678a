//! The permission-check endpoint and the pieces it is declared with.
//!
//! Per request:
//!
//! 1. **Dispatch** (`dispatcher`): verb check, then extraction, then the oracle
//! 2. **Extraction** (`extract`): positional strings or one structured document
//! 3. **Normalization** (`status`): oracle status -> reply status
//!
//! At startup:
//!
//! 1. **Configuration** (`config`): document -> `EndpointConfig`
//! 2. **Registration** (`registration`): `EndpointConfig` -> handler in an `ApiSet`

pub mod config;
pub mod dispatcher;
pub mod extract;
pub mod oracle;
pub mod registration;
pub mod registry;
pub mod reply;
pub mod status;

// Re-export key types for convenient access.
pub use config::{merge_documents, EndpointConfig, ExtensionOptions, EXTENSION_NAME};
pub use dispatcher::PermCheckApi;
pub use extract::{extract_values, ExtractError};
pub use oracle::{AsyncOracle, Grant, GrantParseError, SpawnedOracle, StaticOracle};
pub use registration::{declare, DeclareError, Registration};
pub use registry::{ApiSet, RegistryError};
pub use reply::request_with_reply;
pub use status::normalize;
