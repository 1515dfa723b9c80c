//! Token session state.
//!
//! A [`TokenSession`] owns the current bearer token for one request chain.
//! It performs no I/O; the [`Authenticator`](crate::Authenticator) fills it
//! and the fetcher invalidates it when the upstream rejects the token.
//!
//! ```text
//! NoToken --authenticate--> Valid --buffer reached--> Expired
//!    ^                        |                          |
//!    +---- 401 / redirect ----+                          |
//!    +--------------------- authenticate ----------------+
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::settings::DEFAULT_REFRESH_BUFFER;

/// A session shared between request chains.
///
/// Hold the lock for the whole fetch so validity checks, invalidation and
/// re-authentication by different chains cannot interleave.
pub type SharedTokenSession = Arc<Mutex<TokenSession>>;

// ============================================================================
// Token
// ============================================================================

/// An issued bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Creates a token. `None` expiry means the token never expires.
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Token value to send upstream.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry instant, if the identity service reported one.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns true if the token can still be used at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>, buffer: TimeDelta) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry
                .checked_sub_signed(buffer)
                .is_some_and(|deadline| now < deadline),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Logical state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Never authenticated, or invalidated.
    NoToken,
    /// Holds a usable token.
    Valid,
    /// Holds a token inside the refresh buffer or past expiry.
    Expired,
}

// ============================================================================
// Token Session
// ============================================================================

/// Holder of the current token for one request chain.
#[derive(Debug, Clone)]
pub struct TokenSession {
    token: Option<Token>,
    refresh_buffer: TimeDelta,
}

impl TokenSession {
    /// Creates an empty session with the default refresh buffer.
    pub fn new() -> Self {
        Self::with_refresh_buffer(DEFAULT_REFRESH_BUFFER)
    }

    /// Creates an empty session with a custom refresh buffer.
    pub fn with_refresh_buffer(buffer: Duration) -> Self {
        Self {
            token: None,
            refresh_buffer: TimeDelta::from_std(buffer).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Wraps a new session for sharing across request chains.
    pub fn shared(buffer: Duration) -> SharedTokenSession {
        Arc::new(Mutex::new(Self::with_refresh_buffer(buffer)))
    }

    /// Returns true if a token exists and is outside the refresh buffer.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Validity check against an explicit clock.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token
            .as_ref()
            .is_some_and(|token| token.is_usable_at(now, self.refresh_buffer))
    }

    /// Current state, for diagnostics.
    pub fn state(&self) -> SessionState {
        match &self.token {
            None => SessionState::NoToken,
            Some(_) if self.is_valid() => SessionState::Valid,
            Some(_) => SessionState::Expired,
        }
    }

    /// Clears the token. Calling this on an empty session is a no-op.
    pub fn invalidate(&mut self) {
        self.token = None;
    }

    /// Returns the token if it is still valid.
    pub fn current_token(&self) -> Result<&Token, FetchError> {
        match &self.token {
            Some(token) if token.is_usable_at(Utc::now(), self.refresh_buffer) => Ok(token),
            Some(_) => Err(FetchError::auth("Token expired; authenticate first")),
            None => Err(FetchError::auth("No token; authenticate first")),
        }
    }

    /// Stores a freshly issued token, replacing any previous one.
    pub fn store(&mut self, token: Token) {
        self.token = Some(token);
    }
}

impl Default for TokenSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn in_secs(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc::now() + TimeDelta::seconds(secs))
    }

    #[test]
    fn test_empty_session() {
        let session = TokenSession::new();
        assert!(!session.is_valid());
        assert_eq!(session.state(), SessionState::NoToken);
        assert!(matches!(session.current_token(), Err(FetchError::Auth { .. })));
    }

    #[test]
    fn test_token_outside_buffer_is_valid() {
        let mut session = TokenSession::new();
        session.store(Token::new("abc", in_secs(3600)));
        assert!(session.is_valid());
        assert_eq!(session.state(), SessionState::Valid);
        assert_eq!(session.current_token().unwrap().value(), "abc");
    }

    #[test]
    fn test_token_inside_buffer_is_expired() {
        let mut session = TokenSession::new();
        session.store(Token::new("abc", in_secs(30)));
        assert!(!session.is_valid());
        assert_eq!(session.state(), SessionState::Expired);
        assert!(session.current_token().is_err());
    }

    #[test]
    fn test_token_without_expiry_never_expires() {
        let mut session = TokenSession::new();
        session.store(Token::new("abc", None));
        let far_future = Utc::now() + TimeDelta::days(3650);
        assert!(session.is_valid_at(far_future));
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let mut session = TokenSession::new();
        session.store(Token::new("abc", None));
        session.invalidate();
        session.invalidate();
        assert_eq!(session.state(), SessionState::NoToken);
    }

    #[test]
    fn test_zero_buffer() {
        let mut session = TokenSession::with_refresh_buffer(Duration::ZERO);
        session.store(Token::new("abc", in_secs(30)));
        assert!(session.is_valid());
    }

    #[test]
    fn test_token_debug_redacts_value() {
        let token = Token::new("super-secret", None);
        assert!(!format!("{token:?}").contains("super-secret"));
    }
}
