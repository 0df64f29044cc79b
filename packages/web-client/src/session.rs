//! Session source abstraction consumed by the authorization context.

use anyhow::Result;
use async_trait::async_trait;
use identity::{Identity, ProfileRecord, SessionEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

/// What the authorization context needs from the identity provider and
/// the profile store, behind one seam so tests can script it.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Resolve the identity behind the current session, if any.
    async fn current_identity(&self) -> Result<Option<Identity>>;

    /// Fetch the profile record carrying the application role.
    async fn profile(&self, user_id: Uuid) -> Result<Option<ProfileRecord>>;

    /// Invalidate the current session with the provider.
    async fn sign_out(&self) -> Result<()>;

    /// Subscribe to session-change notifications (sign-in, sign-out,
    /// token refresh) for the lifetime of one context.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
