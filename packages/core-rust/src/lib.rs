//! PERM-CHECK core — typed request parameters, reply status codes, and the
//! handler / oracle capability traits shared by the server and its hosts.

pub mod request;
pub mod status;
pub mod traits;
pub mod types;

pub use request::{IncomingRequest, ReplySink};
pub use status::ReplyStatus;
pub use traits::{ApiHandler, Completion, PermissionOracle};
pub use types::{CheckTuple, Data, DataError, DataType, OwnedCheckTuple, Param};
