//! Parameter extraction: turns a request's parameters into a [`CheckTuple`].
//!
//! Two encodings are accepted, tried in order:
//!
//! 1. **Positional**: exactly four `Stringz` parameters, taken as client,
//!    user, session and permission. Content is not inspected.
//! 2. **Structured**: exactly one parameter convertible to a structured
//!    document holding the string keys `client`, `user`, `session` and
//!    `permission`. Other keys are ignored.

use permcheck_core::{CheckTuple, DataError, Param};
use serde_json::Value;

const KEY_CLIENT: &str = "client";
const KEY_USER: &str = "user";
const KEY_SESSION: &str = "session";
const KEY_PERMISSION: &str = "permission";

/// Why extraction failed. Every variant is answered with `INVALID_REQUEST`.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("expected 4 string parameters or 1 structured parameter, got {count}")]
    BadShape { count: usize },
    #[error("parameter is not a structured document: {0}")]
    NotConvertible(#[from] DataError),
    #[error("missing key `{0}`")]
    MissingKey(&'static str),
    #[error("key `{0}` is not a string")]
    NotAString(&'static str),
}

/// Extracts the check tuple from `params`, borrowing from them.
///
/// # Errors
///
/// Returns `ExtractError` when neither encoding matches.
pub fn extract_values(params: &[Param]) -> Result<CheckTuple<'_>, ExtractError> {
    if let Some(tuple) = positional(params) {
        return Ok(tuple);
    }

    let [param] = params else {
        return Err(ExtractError::BadShape {
            count: params.len(),
        });
    };
    let doc = param.to_structured()?;
    Ok(CheckTuple {
        client: string_key(doc, KEY_CLIENT)?,
        user: string_key(doc, KEY_USER)?,
        session: string_key(doc, KEY_SESSION)?,
        permission: string_key(doc, KEY_PERMISSION)?,
    })
}

fn positional(params: &[Param]) -> Option<CheckTuple<'_>> {
    let [client, user, session, permission] = params else {
        return None;
    };
    Some(CheckTuple {
        client: client.as_stringz()?,
        user: user.as_stringz()?,
        session: session.as_stringz()?,
        permission: permission.as_stringz()?,
    })
}

fn string_key<'a>(doc: &'a Value, key: &'static str) -> Result<&'a str, ExtractError> {
    doc.get(key)
        .ok_or(ExtractError::MissingKey(key))?
        .as_str()
        .ok_or(ExtractError::NotAString(key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
