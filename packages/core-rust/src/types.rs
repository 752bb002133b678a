use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Type tag attached to every request parameter.
///
/// Tags are compared exactly: a `Json` parameter holding a JSON string is
/// not a `Stringz` parameter, even though both carry text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Raw null-terminated string.
    Stringz,
    /// JSON text, not yet parsed.
    Json,
    /// Already-parsed structured document.
    JsonValue,
    /// Boolean scalar.
    Bool,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// 64-bit IEEE 754 float.
    F64,
    /// Opaque binary payload. Never convertible to a structured document.
    Bytes,
}

/// Typed parameter value as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Stringz(String),
    Json(String),
    JsonValue(serde_json::Value),
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    Bytes(Vec<u8>),
}

impl Data {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Stringz(_) => DataType::Stringz,
            Self::Json(_) => DataType::Json,
            Self::JsonValue(_) => DataType::JsonValue,
            Self::Bool(_) => DataType::Bool,
            Self::I32(_) => DataType::I32,
            Self::I64(_) => DataType::I64,
            Self::F64(_) => DataType::F64,
            Self::Bytes(_) => DataType::Bytes,
        }
    }
}

impl From<&str> for Data {
    fn from(s: &str) -> Self {
        Self::Stringz(s.to_string())
    }
}

impl From<serde_json::Value> for Data {
    fn from(value: serde_json::Value) -> Self {
        Self::JsonValue(value)
    }
}

/// Errors converting a parameter to another representation.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no conversion from {from:?} to a structured document")]
    NoConversion { from: DataType },
    #[error("invalid JSON text: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("non-finite float {0} has no JSON representation")]
    NonFinite(f64),
}

/// A request parameter: the transported value plus its cached structured form.
///
/// The structured form is computed at most once and then borrowed for as
/// long as the parameter lives, so callers can hold `&str` slices into it.
#[derive(Debug)]
pub struct Param {
    data: Data,
    structured: OnceLock<serde_json::Value>,
}

impl Param {
    #[must_use]
    pub fn new(data: Data) -> Self {
        Self {
            data,
            structured: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn data(&self) -> &Data {
        &self.data
    }

    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    /// Returns the raw string if this parameter is tagged `Stringz`.
    #[must_use]
    pub fn as_stringz(&self) -> Option<&str> {
        match &self.data {
            Data::Stringz(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the parameter to a structured document.
    ///
    /// `JsonValue` is returned as is and `Json` text is parsed. A `Stringz`
    /// becomes a JSON string, never parsed. Scalars become the matching JSON
    /// scalar. `Bytes` has no conversion.
    ///
    /// # Errors
    ///
    /// Returns `DataError` when the value has no structured form.
    pub fn to_structured(&self) -> Result<&serde_json::Value, DataError> {
        if let Data::JsonValue(value) = &self.data {
            return Ok(value);
        }
        if let Some(value) = self.structured.get() {
            return Ok(value);
        }
        let converted = match &self.data {
            Data::Json(text) => serde_json::from_str(text)?,
            Data::Stringz(s) => serde_json::Value::String(s.clone()),
            Data::Bool(b) => serde_json::Value::Bool(*b),
            Data::I32(n) => serde_json::Value::from(*n),
            Data::I64(n) => serde_json::Value::from(*n),
            Data::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or(DataError::NonFinite(*f))?,
            Data::Bytes(_) | Data::JsonValue(_) => {
                return Err(DataError::NoConversion {
                    from: self.data_type(),
                })
            }
        };
        Ok(self.structured.get_or_init(|| converted))
    }
}

impl From<Data> for Param {
    fn from(data: Data) -> Self {
        Self::new(data)
    }
}

/// The four strings a permission check is made of.
///
/// Borrows from the request parameters; it is never partially populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckTuple<'a> {
    pub client: &'a str,
    pub user: &'a str,
    pub session: &'a str,
    pub permission: &'a str,
}

impl CheckTuple<'_> {
    /// Copies the tuple out of the request so it can cross an `.await`.
    #[must_use]
    pub fn to_owned_tuple(&self) -> OwnedCheckTuple {
        OwnedCheckTuple {
            client: self.client.to_string(),
            user: self.user.to_string(),
            session: self.session.to_string(),
            permission: self.permission.to_string(),
        }
    }
}

/// Owned counterpart of [`CheckTuple`], for oracles that finish later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnedCheckTuple {
    pub client: String,
    pub user: String,
    pub session: String,
    pub permission: String,
}
