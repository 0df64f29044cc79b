//! Server dependencies for the gateway (using traits for testability)
//!
//! This module provides the dependency container handed to the edge
//! interceptor and the page handlers, plus the production adapters that
//! implement the kernel traits against the hosted identity provider and
//! the Postgres profile table.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use identity::{
    IdentityService, ProfileRecord, Role, SessionCookie, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::{BaseIdentityProvider, BaseProfileStore, SessionLookup};
use crate::server::middleware::cookies::parse_cookie;

// =============================================================================
// IdentityService Adapter (implements BaseIdentityProvider trait)
// =============================================================================

/// Wrapper around the provider HTTP client that implements
/// BaseIdentityProvider. Provider-side failures (network, 5xx) are
/// reported through `SessionLookup::error` - they are data for the
/// interceptor's error branch, not exceptions.
pub struct IdentityAdapter {
    service: IdentityService,
}

impl IdentityAdapter {
    pub fn new(service: IdentityService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BaseIdentityProvider for IdentityAdapter {
    async fn get_current_user(&self, headers: &HeaderMap) -> Result<SessionLookup> {
        let access_token = parse_cookie(headers, ACCESS_TOKEN_COOKIE);
        let refresh_token = parse_cookie(headers, REFRESH_TOKEN_COOKIE);

        // Verify the access token first; fall back to the refresh token
        // when it is expired. The provider owns all token semantics.
        if let Some(token) = access_token {
            match self.service.get_user(&token).await {
                Ok(Some(identity)) => return Ok(SessionLookup::authenticated(identity)),
                Ok(None) => {} // expired or revoked - try refresh below
                Err(error) => return Ok(SessionLookup::provider_error(error.to_string())),
            }
        }

        let Some(refresh) = refresh_token else {
            return Ok(SessionLookup::anonymous());
        };

        match self.service.refresh_session(&refresh).await {
            Ok(Some(session)) => Ok(SessionLookup::authenticated(session.identity)
                .with_rotation(vec![
                    SessionCookie::new(ACCESS_TOKEN_COOKIE, session.access_token),
                    SessionCookie::new(REFRESH_TOKEN_COOKIE, session.refresh_token),
                ])),
            // Refresh token revoked or expired: no session, not an error.
            Ok(None) => Ok(SessionLookup::anonymous()),
            Err(error) => Ok(SessionLookup::provider_error(error.to_string())),
        }
    }

    async fn exchange_code(&self, code: &str) -> Result<SessionLookup> {
        match self.service.exchange_code(code).await {
            Ok(Some(session)) => Ok(SessionLookup::authenticated(session.identity)
                .with_rotation(vec![
                    SessionCookie::new(ACCESS_TOKEN_COOKIE, session.access_token),
                    SessionCookie::new(REFRESH_TOKEN_COOKIE, session.refresh_token),
                ])),
            Ok(None) => Ok(SessionLookup::provider_error("auth code rejected")),
            Err(error) => Ok(SessionLookup::provider_error(error.to_string())),
        }
    }

    async fn sign_out(&self, headers: &HeaderMap) -> Result<()> {
        if let Some(token) = parse_cookie(headers, ACCESS_TOKEN_COOKIE) {
            self.service.sign_out(&token).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Postgres Profile Store (implements BaseProfileStore trait)
// =============================================================================

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_record(self) -> Result<ProfileRecord> {
        let role = Role::parse(&self.role).map_err(|e| anyhow::anyhow!(e))?;
        Ok(ProfileRecord {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[async_trait]
impl BaseProfileStore for PgProfileStore {
    async fn get_by_user_id(&self, user_id: Uuid) -> Result<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, email, full_name, role, created_at, updated_at \
             FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProfileRow::into_record).transpose()
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to the interceptor and handlers
/// (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub identity: Arc<dyn BaseIdentityProvider>,
    pub profiles: Arc<dyn BaseProfileStore>,
    /// Database pool for the health check (optional for tests)
    pub db_pool: Option<PgPool>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        identity: Arc<dyn BaseIdentityProvider>,
        profiles: Arc<dyn BaseProfileStore>,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            identity,
            profiles,
            db_pool,
        }
    }
}
