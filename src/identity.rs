use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use chrono::{DateTime, Duration, Utc};
use http::request::Parts;
use http::StatusCode;

use crate::models::UserId;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_ISSUED_AT_HEADER: &str = "x-session-issued-at";

/// Settings owned by the upstream identity provider, injected here only so
/// stale forwarded sessions can be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityConfig {
    pub token_lifetime_minutes: i64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_lifetime_minutes: 1440,
        }
    }
}

impl IdentityConfig {
    /// A lifetime too large for a chrono duration never expires.
    pub fn session_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match Duration::try_minutes(self.token_lifetime_minutes) {
            Some(lifetime) => now.signed_duration_since(issued_at) > lifetime,
            None => false,
        }
    }
}

/// The verified caller, as asserted by the identity provider in front of us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    IdentityConfig: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cfg = IdentityConfig::from_ref(state);

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<UserId>().ok())
            .ok_or_else(|| e401("missing or malformed user identity"))?;

        if let Some(raw) = parts.headers.get(SESSION_ISSUED_AT_HEADER) {
            let issued_at = raw
                .to_str()
                .ok()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .ok_or_else(|| e401("malformed session timestamp"))?
                .with_timezone(&Utc);
            if cfg.session_expired(issued_at, Utc::now()) {
                return Err(e401("session expired"));
            }
        }

        Ok(CurrentUser(user_id))
    }
}

fn e401(msg: &str) -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, msg.to_string())
}
