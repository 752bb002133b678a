//! PERM-CHECK server — a single-verb permission-check endpoint declared into
//! scoped API sets and backed by an asynchronous permission oracle.

pub mod service;

pub use service::{declare, ApiSet, EndpointConfig, PermCheckApi, Registration};
