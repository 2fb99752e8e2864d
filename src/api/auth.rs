//! Admin authorization
//!
//! Who may trigger a run is decided outside this crate. Handlers only see
//! the [`AdminAuthorizer`] seam; the bundled implementation checks a static
//! bearer token from configuration.

use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::{Error, Result};

/// An authenticated administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: String,
}

impl AdminIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Value recorded as `last_run_by` in the run log
    pub fn run_label(&self) -> String {
        format!("admin:{}", self.id)
    }
}

/// Decides whether a request may use admin endpoints
#[async_trait]
pub trait AdminAuthorizer: Send + Sync {
    async fn authorize(&self, headers: &HeaderMap) -> Result<AdminIdentity>;
}

/// Accepts `Authorization: Bearer <token>` matching a configured token
///
/// With no token configured every request is rejected.
#[derive(Debug, Clone)]
pub struct StaticTokenAuthorizer {
    token: Option<String>,
    identity: String,
}

impl StaticTokenAuthorizer {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            identity: "token".to_string(),
        }
    }

    /// Identity reported for requests carrying the token
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

/// Compare without short-circuiting on the first differing byte
fn tokens_match(expected: &str, given: &str) -> bool {
    let (a, b) = (expected.as_bytes(), given.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[async_trait]
impl AdminAuthorizer for StaticTokenAuthorizer {
    async fn authorize(&self, headers: &HeaderMap) -> Result<AdminIdentity> {
        let Some(expected) = self.token.as_deref() else {
            return Err(Error::unauthorized("admin token not configured"));
        };
        let Some(given) = bearer_token(headers) else {
            return Err(Error::unauthorized("missing bearer token"));
        };
        if !tokens_match(expected, given) {
            return Err(Error::unauthorized("invalid admin token"));
        }
        Ok(AdminIdentity::new(self.identity.clone()))
    }
}
