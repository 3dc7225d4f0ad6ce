use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::{IslanderError, Result};

/// Cookie name the board expects the identity token under.
pub const IDENTITY_COOKIE_KEY: &str = "userhash";

/// A posting identity ("饼干"): a user-chosen label plus the opaque token.
#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// JSON carried by the board's exported cookie QR codes.
#[derive(Deserialize)]
struct ImportPayload {
    cookie: String,
    name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
            created_at: Utc::now(),
        }
    }

    /// Parse the raw string decoded from an exported cookie QR code.
    pub fn from_import_payload(raw: &str) -> Result<Self> {
        let payload: ImportPayload = serde_json::from_str(raw.trim())
            .map_err(|e| IslanderError::InvalidIdentityPayload(e.to_string()))?;

        if payload.name.trim().is_empty() || payload.cookie.trim().is_empty() {
            return Err(IslanderError::InvalidIdentityPayload(
                "name and cookie must not be empty".into(),
            ));
        }

        Ok(Self::new(payload.name, payload.cookie))
    }

    /// `userhash=<token>`, the value of the `Cookie` header.
    pub fn cookie_header_value(&self) -> String {
        format!("{}={}", IDENTITY_COOKIE_KEY, self.token)
    }
}

// The token is a credential; keep it out of logs.
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.token == other.token
    }
}
