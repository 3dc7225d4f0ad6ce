//! Two-shape decoding of board API responses.
//!
//! The board reports logical failures (unknown timeline id, banned cookie, ...)
//! with HTTP 200 and a body like `{"error": "..."}` instead of the expected
//! array. [`decode`] tries the success schema first and, only when the JSON is
//! well-formed but has the wrong shape, falls back to the error schema.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;

use crate::app::{IslanderError, Result};

/// Alternate body shape used for logical failures.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteErrorPayload {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Payload(T),
    SiteError(String),
}

impl<T> Decoded<T> {
    /// Collapse into the crate error type, surfacing site errors as `Site`.
    pub fn into_result(self) -> Result<T> {
        match self {
            Decoded::Payload(value) => Ok(value),
            Decoded::SiteError(message) => Err(IslanderError::Site(message)),
        }
    }
}

/// Neither the success schema nor [`SiteErrorPayload`] matched.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct DecodeError(#[source] serde_json::Error);

impl From<DecodeError> for IslanderError {
    fn from(e: DecodeError) -> Self {
        IslanderError::Decode(e.to_string())
    }
}

pub fn decode<T: DeserializeOwned>(body: &str) -> std::result::Result<Decoded<T>, DecodeError> {
    let err = match serde_json::from_str::<T>(body) {
        Ok(value) => return Ok(Decoded::Payload(value)),
        Err(e) => e,
    };

    // Syntax errors and truncated bodies cannot be a site error either.
    if err.classify() != Category::Data {
        return Err(DecodeError(err));
    }

    match serde_json::from_str::<SiteErrorPayload>(body) {
        Ok(payload) => Ok(Decoded::SiteError(payload.error)),
        Err(_) => Err(DecodeError(err)),
    }
}
