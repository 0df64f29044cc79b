//! Scripted session source and state fixtures for tests.

use crate::context::{AuthPhase, AuthState};
use crate::session::SessionSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use identity::{Identity, ProfileRecord, Role, SessionEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// One scripted answer for `current_identity`.
#[derive(Debug, Clone)]
pub enum ScriptedIdentity {
    Found(Identity),
    Anonymous,
    Fail(String),
}

#[derive(Debug, Clone)]
struct Resolution {
    delay: Duration,
    result: ScriptedIdentity,
}

/// Session source with scripted responses and call recording.
///
/// Queued resolutions are consumed one per `current_identity` call, in
/// order; once the queue is empty the persistent fallback answers. A
/// per-resolution delay lets tests overlap a slow resolution with a
/// faster later one.
pub struct MockSessionSource {
    queued: Mutex<VecDeque<Resolution>>,
    fallback: Mutex<Resolution>,
    profiles: Mutex<HashMap<Uuid, ProfileRecord>>,
    events: broadcast::Sender<SessionEvent>,
    identity_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl MockSessionSource {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Resolution {
                delay: Duration::ZERO,
                result: ScriptedIdentity::Anonymous,
            }),
            profiles: Mutex::new(HashMap::new()),
            events,
            identity_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Persistent fallback: every resolution finds this identity.
    pub fn with_identity(self, identity: Identity) -> Self {
        *self.fallback.lock().unwrap() = Resolution {
            delay: Duration::ZERO,
            result: ScriptedIdentity::Found(identity),
        };
        self
    }

    /// Persistent fallback: every resolution fails.
    pub fn with_failure(self, message: &str) -> Self {
        *self.fallback.lock().unwrap() = Resolution {
            delay: Duration::ZERO,
            result: ScriptedIdentity::Fail(message.to_string()),
        };
        self
    }

    pub fn with_profile(self, profile: ProfileRecord) -> Self {
        self.profiles.lock().unwrap().insert(profile.id, profile);
        self
    }

    /// Queue a one-shot resolution answered after `delay`.
    pub fn push_resolution(&self, delay: Duration, result: ScriptedIdentity) {
        self.queued
            .lock()
            .unwrap()
            .push_back(Resolution { delay, result });
    }

    /// Broadcast a session-change notification to subscribers.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn identity_calls(&self) -> usize {
        self.identity_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSessionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionSource for MockSessionSource {
    async fn current_identity(&self) -> Result<Option<Identity>> {
        self.identity_calls.fetch_add(1, Ordering::SeqCst);
        let resolution = {
            let mut queued = self.queued.lock().unwrap();
            queued
                .pop_front()
                .unwrap_or_else(|| self.fallback.lock().unwrap().clone())
        };
        if !resolution.delay.is_zero() {
            tokio::time::sleep(resolution.delay).await;
        }
        match resolution.result {
            ScriptedIdentity::Found(identity) => Ok(Some(identity)),
            ScriptedIdentity::Anonymous => Ok(None),
            ScriptedIdentity::Fail(message) => Err(anyhow!(message)),
        }
    }

    async fn profile(&self, user_id: Uuid) -> Result<Option<ProfileRecord>> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

pub fn test_identity(id: Uuid, email: &str) -> Identity {
    Identity {
        id,
        email: email.to_string(),
        issued_role_claims: None,
    }
}

pub fn test_profile(id: Uuid, email: &str, role: Role) -> ProfileRecord {
    ProfileRecord {
        id,
        email: email.to_string(),
        full_name: "Test User".to_string(),
        role,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn base_state() -> AuthState {
    AuthState {
        user: None,
        db_user: None,
        is_admin: false,
        is_loading: false,
        is_page_loading: false,
        error: None,
        phase: AuthPhase::Anonymous,
    }
}

pub fn anonymous_state() -> AuthState {
    base_state()
}

pub fn loading_state() -> AuthState {
    AuthState {
        is_loading: true,
        phase: AuthPhase::Loading,
        ..base_state()
    }
}

pub fn employee_state() -> AuthState {
    let id = Uuid::new_v4();
    AuthState {
        user: Some(test_identity(id, "employee@example.com")),
        db_user: Some(test_profile(id, "employee@example.com", Role::Employee)),
        phase: AuthPhase::Authenticated,
        ..base_state()
    }
}

pub fn admin_state() -> AuthState {
    let id = Uuid::new_v4();
    AuthState {
        user: Some(test_identity(id, "admin@example.com")),
        db_user: Some(test_profile(id, "admin@example.com", Role::Admin)),
        is_admin: true,
        phase: AuthPhase::Authenticated,
        ..base_state()
    }
}
