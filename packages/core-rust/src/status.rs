use std::fmt;

use serde::{Deserialize, Serialize};

/// Status code carried by a reply.
///
/// Non-negative values are success; negative values follow the host
/// framework's errno table. Oracles may return any value, so this is an open
/// newtype rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyStatus(pub i32);

impl ReplyStatus {
    pub const OK: Self = Self(0);
    pub const INTERNAL_ERROR: Self = Self(-1);
    pub const OUT_OF_MEMORY: Self = Self(-2);
    pub const UNKNOWN_API: Self = Self(-3);
    pub const UNKNOWN_VERB: Self = Self(-4);
    pub const NOT_AVAILABLE: Self = Self(-5);
    pub const UNAUTHORIZED: Self = Self(-6);
    pub const INVALID_TOKEN: Self = Self(-7);
    pub const FORBIDDEN: Self = Self(-8);
    pub const INSUFFICIENT_SCOPE: Self = Self(-9);
    pub const BAD_API_STATE: Self = Self(-10);
    pub const NO_REPLY: Self = Self(-11);
    pub const INVALID_REQUEST: Self = Self(-12);
    pub const NO_ITEM: Self = Self(-13);
    pub const BAD_STATE: Self = Self(-14);
    pub const DISCONNECTED: Self = Self(-15);
    pub const GENERIC_FAILURE: Self = Self(-16);

    #[must_use]
    pub fn code(self) -> i32 {
        self.0
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// Symbolic name for the predefined codes, `None` for anything else.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::OK => "ok",
            Self::INTERNAL_ERROR => "internal-error",
            Self::OUT_OF_MEMORY => "out-of-memory",
            Self::UNKNOWN_API => "unknown-api",
            Self::UNKNOWN_VERB => "unknown-verb",
            Self::NOT_AVAILABLE => "not-available",
            Self::UNAUTHORIZED => "unauthorized",
            Self::INVALID_TOKEN => "invalid-token",
            Self::FORBIDDEN => "forbidden",
            Self::INSUFFICIENT_SCOPE => "insufficient-scope",
            Self::BAD_API_STATE => "bad-api-state",
            Self::NO_REPLY => "no-reply",
            Self::INVALID_REQUEST => "invalid-request",
            Self::NO_ITEM => "no-item",
            Self::BAD_STATE => "bad-state",
            Self::DISCONNECTED => "disconnected",
            Self::GENERIC_FAILURE => "generic-failure",
            _ => return None,
        };
        Some(name)
    }
}

impl From<i32> for ReplyStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for ReplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}
