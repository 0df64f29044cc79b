use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Resolved user reference from the identity provider.
///
/// Ephemeral - resolved per request / per notification, never stored
/// beyond the scope that resolved it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    /// Role claims issued by the provider, if the project attaches any.
    /// Authorization decisions use the profile record, not these.
    #[serde(default)]
    pub issued_role_claims: Option<serde_json::Value>,
}

/// Application-level role carried by a profile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    /// Parse a stored role string. Unknown values are an error so that a
    /// corrupted row can never silently grant access.
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Authorization-relevant projection of the user entity, owned by the
/// application database. The gateway reads it to learn the role and
/// never writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A single session cookie pair to persist on a response.
///
/// Values are opaque - expiry and refresh semantics belong to the
/// provider. The gateway only forwards and persists them.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Session-change notification emitted by the provider client.
///
/// Consumers subscribe for the lifetime of one browser-tab context and
/// re-resolve identity + profile on every event.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SignedIn(Identity),
    SignedOut,
    TokenRefreshed(Identity),
    SessionError(String),
}

/// Cookie names the provider issues and the gateway persists.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";
