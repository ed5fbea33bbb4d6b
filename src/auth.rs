//! Caller authentication for REST and WebSocket endpoints.
//!
//! A request is authenticated by an `Authorization: Bearer <credential>`
//! header or a `session=<credential>` cookie. The credential is resolved to
//! a user id by the configured [`Authenticator`].

use std::collections::HashMap;
use std::fmt;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::error::ElectionError;

/// Name of the cookie carrying a session credential.
pub const SESSION_COOKIE: &str = "session";

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Stable user identifier; also the voter identity for token lookups.
    pub user_id: String,
}

/// Resolves a presented credential to a [`Caller`].
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Returns the caller for `credential`, or `None` if it is not accepted.
    fn authenticate(&self, credential: &str) -> Option<Caller>;
}

/// Fixed credential table loaded from configuration.
pub struct StaticAuthenticator {
    credentials: HashMap<String, String>,
}

impl StaticAuthenticator {
    /// Creates an authenticator accepting the given `credential -> user_id` map.
    #[must_use]
    pub fn new(credentials: HashMap<String, String>) -> Self {
        Self { credentials }
    }
}

// Credentials are secrets; only the count is printed.
impl fmt::Debug for StaticAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticAuthenticator")
            .field("credentials", &self.credentials.len())
            .finish()
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, credential: &str) -> Option<Caller> {
        self.credentials.get(credential).map(|user_id| Caller {
            user_id: user_id.clone(),
        })
    }
}

/// Extracts the raw credential from the request headers, preferring the
/// bearer token over the session cookie.
fn credential_from(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = ElectionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = credential_from(parts).and_then(|c| state.authenticator.authenticate(c));
        match caller {
            Some(caller) => Ok(caller),
            None => {
                tracing::debug!(path = %parts.uri.path(), "unauthenticated request rejected");
                Err(ElectionError::Unauthenticated)
            }
        }
    }
}
