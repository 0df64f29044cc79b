// TestDependencies - mock implementations for testing
//
// Provides mock identity providers and profile stores that can be
// injected into ServerDeps for interceptor and handler tests.

use anyhow::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use identity::{Identity, ProfileRecord, Role, SessionCookie};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{BaseIdentityProvider, BaseProfileStore, SessionLookup};

// =============================================================================
// Mock Identity Provider
// =============================================================================

/// Scriptable identity provider.
///
/// One-shot responses can be queued with `push_lookup`; when the queue is
/// empty the fallback response (set with `with_*`) is returned, so a test
/// can simulate e.g. a provider that fails on every request.
pub struct MockIdentityProvider {
    queued: Mutex<VecDeque<SessionLookup>>,
    fallback: Mutex<SessionLookup>,
    exchange: Mutex<SessionLookup>,
    lookup_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(SessionLookup::anonymous()),
            exchange: Mutex::new(SessionLookup::provider_error("no exchange scripted")),
            lookup_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every lookup resolves to this identity.
    pub fn with_user(self, identity: Identity) -> Self {
        *self.fallback.lock().unwrap() = SessionLookup::authenticated(identity);
        self
    }

    /// Every lookup reports a provider-side failure.
    pub fn with_provider_error(self, message: &str) -> Self {
        *self.fallback.lock().unwrap() = SessionLookup::provider_error(message);
        self
    }

    /// Every lookup resolves to this identity plus rotated cookies.
    pub fn with_rotation(self, identity: Identity, rotated: Vec<SessionCookie>) -> Self {
        *self.fallback.lock().unwrap() =
            SessionLookup::authenticated(identity).with_rotation(rotated);
        self
    }

    /// Script the code-exchange result.
    pub fn with_exchange(self, lookup: SessionLookup) -> Self {
        *self.exchange.lock().unwrap() = lookup;
        self
    }

    /// Every lookup returns `Err`, simulating a failure the adapter did
    /// not convert into a `SessionLookup` (distinct from a scripted
    /// provider error, which is data in the lookup).
    pub fn with_lookup_failure(self, message: &str) -> Self {
        *self.lookup_failure.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Queue a one-shot lookup result (consumed before the fallback).
    pub fn push_lookup(&self, lookup: SessionLookup) {
        self.queued.lock().unwrap().push_back(lookup);
    }

    /// Operations invoked, in order ("get_current_user", "exchange_code",
    /// "sign_out").
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == "get_current_user")
            .count()
    }

    fn record(&self, op: &str) {
        self.calls.lock().unwrap().push(op.to_string());
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityProvider for MockIdentityProvider {
    async fn get_current_user(&self, _headers: &HeaderMap) -> Result<SessionLookup> {
        self.record("get_current_user");
        if let Some(message) = self.lookup_failure.lock().unwrap().clone() {
            anyhow::bail!(message);
        }
        if let Some(lookup) = self.queued.lock().unwrap().pop_front() {
            return Ok(lookup);
        }
        Ok(self.fallback.lock().unwrap().clone())
    }

    async fn exchange_code(&self, _code: &str) -> Result<SessionLookup> {
        self.record("exchange_code");
        Ok(self.exchange.lock().unwrap().clone())
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<()> {
        self.record("sign_out");
        Ok(())
    }
}

// =============================================================================
// Mock Profile Store
// =============================================================================

pub struct MockProfileStore {
    records: Mutex<HashMap<Uuid, ProfileRecord>>,
    fail_with: Mutex<Option<String>>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_with: Mutex::new(None),
        }
    }

    pub fn with_record(self, record: ProfileRecord) -> Self {
        self.records.lock().unwrap().insert(record.id, record);
        self
    }

    /// Every fetch fails with this message.
    pub fn failing(self, message: &str) -> Self {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
        self
    }
}

impl Default for MockProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseProfileStore for MockProfileStore {
    async fn get_by_user_id(&self, user_id: Uuid) -> Result<Option<ProfileRecord>> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            anyhow::bail!(message);
        }
        Ok(self.records.lock().unwrap().get(&user_id).cloned())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn test_identity(id: Uuid, email: &str) -> Identity {
    Identity {
        id,
        email: email.to_string(),
        issued_role_claims: None,
    }
}

pub fn test_profile(id: Uuid, email: &str, role: Role) -> ProfileRecord {
    let now = Utc::now();
    ProfileRecord {
        id,
        email: email.to_string(),
        full_name: "Test User".to_string(),
        role,
        created_at: now,
        updated_at: now,
    }
}

/// ServerDeps wired to the given mocks, no database.
pub fn test_deps(
    identity: Arc<MockIdentityProvider>,
    profiles: Arc<MockProfileStore>,
) -> super::ServerDeps {
    super::ServerDeps::new(identity, profiles, None)
}
