//! Signin session and token bookkeeping.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Token response from the signin endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The bearer token.
    pub access_token: String,

    /// Token type, normally "Bearer".
    #[serde(default)]
    pub token_type: Option<String>,

    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a session from a signin response.
    #[must_use]
    pub fn from_response(response: TokenResponse) -> Self {
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        Self {
            access_token: response.access_token,
            expires_at,
        }
    }

    /// The bearer token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Whether the token is past (or within 30 seconds of) its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|at| at - chrono::Duration::seconds(30) <= Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_without_expiry_never_expires() {
        let session = Session::from_response(TokenResponse {
            access_token: "tok".into(),
            token_type: Some("Bearer".into()),
            expires_in: None,
        });
        assert!(!session.is_expired());
        assert_eq!(session.access_token(), "tok");
    }

    #[test]
    fn session_near_expiry_counts_as_expired() {
        let session = Session::from_response(TokenResponse {
            access_token: "tok".into(),
            token_type: None,
            expires_in: Some(10),
        });
        assert!(session.is_expired());
    }

    #[test]
    fn session_with_long_expiry_is_fresh() {
        let session = Session::from_response(TokenResponse {
            access_token: "tok".into(),
            token_type: None,
            expires_in: Some(3600),
        });
        assert!(!session.is_expired());
    }
}
