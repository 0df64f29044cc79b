// HTTP client for the hosted identity provider's auth API.
//
// The provider owns credential issuance, token expiry and rotation. This
// client only calls the documented endpoints and reports what it got
// back; policy (redirects, role checks) lives in the server and
// web-client crates.

pub mod models;

use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

pub use models::{
    Identity, ProfileRecord, Role, SessionCookie, SessionEvent, ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider returned {status}: {body}")]
    Provider { status: StatusCode, body: String },

    #[error("identity provider returned an unexpected payload: {0}")]
    Payload(String),
}

#[derive(Debug, Clone)]
pub struct IdentityOptions {
    /// Base URL of the provider project, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Public (anon) API key sent on every request.
    pub anon_key: String,
}

/// Wire shape of the provider's user object.
#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: String,
    #[serde(default)]
    app_metadata: Option<serde_json::Value>,
}

impl UserPayload {
    fn into_identity(self) -> Identity {
        Identity {
            id: self.id,
            email: self.email,
            issued_role_claims: self.app_metadata,
        }
    }
}

/// Wire shape of the provider's token grant response.
#[derive(Debug, Deserialize)]
struct TokenGrantPayload {
    access_token: String,
    refresh_token: String,
    user: UserPayload,
}

/// A freshly issued session: rotated tokens plus the identity they prove.
#[derive(Debug, Clone)]
pub struct RefreshedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub identity: Identity,
}

#[derive(Debug, Clone)]
pub struct IdentityService {
    options: IdentityOptions,
    client: Client,
}

impl IdentityService {
    pub fn new(options: IdentityOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.options.base_url.trim_end_matches('/'), path)
    }

    /// Resolve the identity behind an access token.
    ///
    /// `Ok(None)` means the token is invalid or expired (the caller may
    /// try a refresh); transport failures and 5xx responses are errors.
    pub async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        let response = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.options.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let user: UserPayload = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Payload(e.to_string()))?;
                Ok(Some(user.into_identity()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(IdentityError::Provider {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Exchange a refresh token for a rotated session.
    pub async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Option<RefreshedSession>, IdentityError> {
        self.token_grant(
            "token?grant_type=refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    /// Exchange a one-time auth code (PKCE flow) for a session.
    pub async fn exchange_code(&self, code: &str) -> Result<Option<RefreshedSession>, IdentityError> {
        self.token_grant(
            "token?grant_type=pkce",
            serde_json::json!({ "auth_code": code }),
        )
        .await
    }

    async fn token_grant(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Option<RefreshedSession>, IdentityError> {
        let response = self
            .client
            .post(self.auth_url(path))
            .header("apikey", &self.options.anon_key)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let grant: TokenGrantPayload = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Payload(e.to_string()))?;
                Ok(Some(RefreshedSession {
                    access_token: grant.access_token,
                    refresh_token: grant.refresh_token,
                    identity: grant.user.into_identity(),
                }))
            }
            // Revoked or expired grant - there is no session to rotate.
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => Err(IdentityError::Provider {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Invalidate the session behind an access token.
    ///
    /// A 401 means the session is already gone; sign-out is idempotent.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.auth_url("logout"))
            .header("apikey", &self.options.anon_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK | StatusCode::UNAUTHORIZED => Ok(()),
            status => Err(IdentityError::Provider {
                status,
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
