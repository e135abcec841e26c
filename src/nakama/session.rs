//! Session token returned by authentication, and its decoded claims.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Session {
    pub created: bool,
    pub token: String,
    pub refresh_token: String,
}

/// Identity claims carried in the token payload segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionClaims {
    /// Backend user id
    pub uid: String,
    /// Username
    pub usn: String,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Session variables supplied at authentication
    pub vrs: HashMap<String, String>,
}

impl Session {
    /// Decode the claims from the middle segment of the compact token.
    pub fn claims(&self) -> Result<SessionClaims> {
        let mut parts = self.token.split('.');
        let segment = match (parts.next(), parts.next()) {
            (Some(_), Some(p)) if !p.is_empty() => p,
            _ => return Err(Error::InvalidToken("expected header.payload.signature".into())),
        };
        let raw = URL_SAFE_NO_PAD
            .decode(segment.trim_end_matches('='))
            .map_err(|e| Error::InvalidToken(e.to_string()))?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
