// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no gateway policy. Policy (what
// to redirect where) lives in the edge interceptor and the page handlers,
// which consume these traits.
//
// Naming convention: Base* for trait names (e.g., BaseIdentityProvider)

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use identity::{Identity, ProfileRecord, SessionCookie};
use uuid::Uuid;

// =============================================================================
// Identity Provider Trait (Infrastructure - session verification/refresh)
// =============================================================================

/// Result of a "get current user" round trip against the provider.
///
/// Mirrors the provider's `{ identity | null, error | null }` contract,
/// plus any cookie rotation the refresh produced. `error` is a
/// provider-side failure (transport, 5xx); an invalid or absent session
/// is NOT an error, it is `identity: None`.
#[derive(Debug, Clone, Default)]
pub struct SessionLookup {
    pub identity: Option<Identity>,
    pub error: Option<String>,
    pub rotated: Vec<SessionCookie>,
}

impl SessionLookup {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            ..Self::default()
        }
    }

    pub fn provider_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotated: Vec<SessionCookie>) -> Self {
        self.rotated = rotated;
        self
    }
}

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Resolve the current user from the request's session cookies.
    ///
    /// Called once per request, for every request: this both
    /// authenticates the caller and triggers token refresh. Rotated
    /// cookies come back in the lookup for the interceptor to persist.
    async fn get_current_user(&self, headers: &HeaderMap) -> Result<SessionLookup>;

    /// Exchange a one-time auth code for a session (callback flow).
    async fn exchange_code(&self, code: &str) -> Result<SessionLookup>;

    /// Invalidate the session carried by the request, if any.
    async fn sign_out(&self, headers: &HeaderMap) -> Result<()>;
}

// =============================================================================
// Profile Store Trait (Infrastructure - read-only role lookup)
// =============================================================================

#[async_trait]
pub trait BaseProfileStore: Send + Sync {
    /// Fetch the profile record for a provider-issued user id.
    ///
    /// Read-only: profile creation on first login belongs to the
    /// authenticated shell, not the gateway.
    async fn get_by_user_id(&self, user_id: Uuid) -> Result<Option<ProfileRecord>>;
}
