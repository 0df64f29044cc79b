//! Reactive authorization context.
//!
//! One `AuthContext` exists per mounted shell. It owns the canonical
//! `AuthState`, resolves identity and profile through the `SessionSource`,
//! and follows the provider's session-change notifications for as long
//! as it is mounted.
//!
//! Concurrency model: every notification takes a generation number the
//! moment it arrives, in arrival order. Resolutions run concurrently,
//! but a resolution may only publish while its generation is still the
//! newest one. A slow resolution for an old notification can therefore
//! never overwrite the result of a newer one.

use crate::session::SessionSource;
use identity::{Identity, ProfileRecord, Role, SessionEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch, OnceCell};
use tokio::task::JoinHandle;

/// Navigation target after a successful logout.
pub const LOGOUT_LANDING: &str = "/";

const SESSION_ERROR_MESSAGE: &str =
    "We couldn't load your session. Please refresh the page or sign in again.";

/// Lifecycle phase of the authorization context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Mounted, `initialize` not yet called.
    Uninitialized,
    /// A session resolution is in flight.
    Loading,
    Authenticated,
    Anonymous,
    /// Session resolution failed. Cleared by a later notification.
    Errored,
}

/// Snapshot of the current authorization state.
///
/// `user` and `db_user` always move together: a state change publishes
/// both at once, so no reader ever observes an identity paired with a
/// profile (or admin flag) from a different session.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<Identity>,
    pub db_user: Option<ProfileRecord>,
    pub is_admin: bool,
    /// A session resolution is in flight.
    pub is_loading: bool,
    /// A client-side page navigation is in flight.
    pub is_page_loading: bool,
    pub error: Option<String>,
    pub phase: AuthPhase,
}

impl AuthState {
    fn uninitialized() -> Self {
        Self {
            user: None,
            db_user: None,
            is_admin: false,
            is_loading: false,
            is_page_loading: false,
            error: None,
            phase: AuthPhase::Uninitialized,
        }
    }

    fn authenticated(user: Identity, db_user: Option<ProfileRecord>) -> Self {
        let is_admin = db_user
            .as_ref()
            .map(|p| p.role == Role::Admin)
            .unwrap_or(false);
        Self {
            user: Some(user),
            db_user,
            is_admin,
            is_loading: false,
            is_page_loading: false,
            error: None,
            phase: AuthPhase::Authenticated,
        }
    }

    fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Anonymous,
            ..Self::uninitialized()
        }
    }

    fn errored() -> Self {
        Self {
            error: Some(SESSION_ERROR_MESSAGE.to_string()),
            phase: AuthPhase::Errored,
            ..Self::uninitialized()
        }
    }
}

struct ContextInner {
    source: Arc<dyn SessionSource>,
    state: watch::Sender<AuthState>,
    /// Bumped once per notification, in arrival order. Also bumped on
    /// logout and unmount to invalidate in-flight resolutions.
    generation: AtomicU64,
    /// Serializes the generation check and the state write in `publish`.
    publish_lock: Mutex<()>,
    init: OnceCell<()>,
}

impl ContextInner {
    /// Apply a state update if `generation` is still the newest.
    fn publish(&self, generation: u64, update: impl FnOnce(&mut AuthState)) {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding stale session resolution");
            return;
        }
        self.state.send_modify(update);
    }

    fn handle_event(inner: &Arc<Self>, event: SessionEvent) {
        // The generation is taken here, synchronously, so it reflects
        // arrival order even when resolutions finish out of order.
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match event {
            SessionEvent::SignedOut => {
                inner.publish(generation, |state| {
                    let page = state.is_page_loading;
                    *state = AuthState::anonymous();
                    state.is_page_loading = page;
                });
            }
            SessionEvent::SessionError(message) => {
                tracing::warn!(%message, "session error notification");
                inner.publish(generation, |state| {
                    let page = state.is_page_loading;
                    *state = AuthState::errored();
                    state.is_page_loading = page;
                });
            }
            SessionEvent::SignedIn(_) | SessionEvent::TokenRefreshed(_) => {
                // The notification payload is advisory only: the context
                // re-resolves identity and profile from the source.
                let inner = inner.clone();
                tokio::spawn(async move {
                    inner.resolve(generation).await;
                });
            }
        }
    }

    async fn resolve(&self, generation: u64) {
        self.publish(generation, |state| {
            state.is_loading = true;
            state.error = None;
            state.phase = AuthPhase::Loading;
        });

        match self.resolve_session().await {
            Ok(Some((user, db_user))) => {
                self.publish(generation, |state| {
                    let page = state.is_page_loading;
                    *state = AuthState::authenticated(user, db_user);
                    state.is_page_loading = page;
                });
            }
            Ok(None) => {
                self.publish(generation, |state| {
                    let page = state.is_page_loading;
                    *state = AuthState::anonymous();
                    state.is_page_loading = page;
                });
            }
            Err(error) => {
                tracing::error!(%error, "session resolution failed");
                self.publish(generation, |state| {
                    let page = state.is_page_loading;
                    *state = AuthState::errored();
                    state.is_page_loading = page;
                });
            }
        }
    }

    /// Fetch identity and, when present, the profile behind it. Nothing
    /// is published in between, so the pair lands atomically.
    async fn resolve_session(&self) -> anyhow::Result<Option<(Identity, Option<ProfileRecord>)>> {
        let Some(user) = self.source.current_identity().await? else {
            return Ok(None);
        };
        let db_user = self.source.profile(user.id).await?;
        Ok(Some((user, db_user)))
    }
}

/// Per-mount authorization store.
///
/// Dropping the context (or calling [`AuthContext::unmount`]) stops the
/// notification listener and invalidates every in-flight resolution, so
/// no state update lands after unmount.
pub struct AuthContext {
    inner: Arc<ContextInner>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthContext {
    /// Create the context and start following session notifications.
    ///
    /// The shell is expected to call [`initialize`](Self::initialize)
    /// right after mounting.
    pub fn mount(source: Arc<dyn SessionSource>) -> Self {
        let (state, _) = watch::channel(AuthState::uninitialized());
        let mut events = source.subscribe();
        let inner = Arc::new(ContextInner {
            source,
            state,
            generation: AtomicU64::new(0),
            publish_lock: Mutex::new(()),
            init: OnceCell::new(),
        });

        let listener_inner = inner.clone();
        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => ContextInner::handle_event(&listener_inner, event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session notifications lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Self {
            inner,
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Resolve the initial session. Exactly one resolution runs per
    /// mount; concurrent callers await the same in-flight result.
    pub async fn initialize(&self) {
        let inner = self.inner.clone();
        self.inner
            .init
            .get_or_init(|| async move {
                let generation = inner.generation.load(Ordering::SeqCst);
                inner.resolve(generation).await;
            })
            .await;
    }

    /// Current snapshot.
    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    /// Watch for state changes. Receivers see every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Sign out and clear local state.
    ///
    /// Returns the navigation target on an actual sign-out, `None` when
    /// there is no session to leave. Calling it twice is a no-op, not an
    /// error.
    pub async fn logout(&self) -> anyhow::Result<Option<&'static str>> {
        let signed_in = {
            let state = self.inner.state.borrow();
            if matches!(
                state.phase,
                AuthPhase::Anonymous | AuthPhase::Uninitialized
            ) {
                return Ok(None);
            }
            state.user.is_some()
        };

        // The provider only has a session to invalidate when a user is
        // actually resolved; an errored or loading state still clears
        // locally below.
        if signed_in {
            self.inner.source.sign_out().await?;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.publish(generation, |state| {
            let page = state.is_page_loading;
            *state = AuthState::anonymous();
            state.is_page_loading = page;
        });
        Ok(Some(LOGOUT_LANDING))
    }

    /// Flip the page-navigation flag. Called by the shell on every
    /// client-side navigation start and settle.
    pub fn set_page_loading(&self, loading: bool) {
        self.inner.state.send_modify(|state| {
            state.is_page_loading = loading;
        });
    }

    /// Stop the listener and invalidate in-flight resolutions.
    pub fn unmount(&self) {
        // Invalidate first: a resolution that races the abort still
        // fails its generation check and publishes nothing.
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.unmount();
    }
}
