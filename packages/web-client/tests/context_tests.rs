//! Integration tests for the authorization context lifecycle.
//!
//! Paused-clock tests script resolution delays to force the races the
//! context must win: a slow resolution for an old notification finishing
//! after a faster, newer one, and resolutions outliving an unmount.

use identity::{Role, SessionEvent};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use web_client::testing::{test_identity, test_profile, MockSessionSource, ScriptedIdentity};
use web_client::{AuthContext, AuthPhase};

#[tokio::test]
async fn initialize_resolves_identity_and_profile_together() {
    let id = Uuid::new_v4();
    let source = Arc::new(
        MockSessionSource::new()
            .with_identity(test_identity(id, "admin@example.com"))
            .with_profile(test_profile(id, "admin@example.com", Role::Admin)),
    );
    let ctx = AuthContext::mount(source);

    ctx.initialize().await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Authenticated);
    assert_eq!(state.user.as_ref().map(|u| u.email.as_str()), Some("admin@example.com"));
    assert!(state.db_user.is_some());
    assert!(state.is_admin);
    assert!(!state.is_loading);
}

#[tokio::test]
async fn initialize_without_a_session_lands_on_anonymous() {
    let ctx = AuthContext::mount(Arc::new(MockSessionSource::new()));

    ctx.initialize().await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Anonymous);
    assert!(state.user.is_none());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn initialize_failure_surfaces_an_error_and_stops_loading() {
    let source = Arc::new(MockSessionSource::new().with_failure("provider unreachable"));
    let ctx = AuthContext::mount(source);

    ctx.initialize().await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Errored);
    assert!(state.error.is_some());
    assert!(!state.is_loading);
}

#[tokio::test]
async fn concurrent_initialize_shares_one_resolution() {
    let id = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new().with_identity(test_identity(id, "worker@example.com")));
    let ctx = AuthContext::mount(source.clone());

    tokio::join!(ctx.initialize(), ctx.initialize(), ctx.initialize());

    assert_eq!(source.identity_calls(), 1);
    assert_eq!(ctx.state().phase, AuthPhase::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn later_notification_wins_even_when_it_finishes_first() {
    let id_a = Uuid::new_v4();
    let id_b = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new());
    // First notification resolves slowly to A, second quickly to B.
    source.push_resolution(
        Duration::from_millis(100),
        ScriptedIdentity::Found(test_identity(id_a, "old@example.com")),
    );
    source.push_resolution(
        Duration::from_millis(10),
        ScriptedIdentity::Found(test_identity(id_b, "new@example.com")),
    );
    let ctx = AuthContext::mount(source.clone());

    source.emit(SessionEvent::SignedIn(test_identity(id_a, "old@example.com")));
    source.emit(SessionEvent::SignedIn(test_identity(id_b, "new@example.com")));

    // Let both resolutions run to completion.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Authenticated);
    assert_eq!(state.user.as_ref().map(|u| u.email.as_str()), Some("new@example.com"));
}

#[tokio::test(start_paused = true)]
async fn signed_out_notification_clears_the_session() {
    let id = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new().with_identity(test_identity(id, "worker@example.com")));
    let ctx = AuthContext::mount(source.clone());
    ctx.initialize().await;
    assert_eq!(ctx.state().phase, AuthPhase::Authenticated);

    source.emit(SessionEvent::SignedOut);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Anonymous);
    assert!(state.user.is_none());
    assert!(!state.is_admin);
}

#[tokio::test(start_paused = true)]
async fn session_error_is_cleared_by_a_later_sign_in() {
    let id = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new().with_identity(test_identity(id, "worker@example.com")));
    let ctx = AuthContext::mount(source.clone());

    source.emit(SessionEvent::SessionError("token revoked".to_string()));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(ctx.state().phase, AuthPhase::Errored);

    source.emit(SessionEvent::SignedIn(test_identity(id, "worker@example.com")));
    tokio::time::sleep(Duration::from_millis(10)).await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Authenticated);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn logout_before_any_sign_in_never_calls_the_provider() {
    let source = Arc::new(MockSessionSource::new());
    let ctx = AuthContext::mount(source.clone());

    // Uninitialized: nothing to sign out of.
    let target = ctx.logout().await.unwrap();
    assert_eq!(target, None);
    assert_eq!(source.sign_out_calls(), 0);

    // Same once the anonymous resolution has settled.
    ctx.initialize().await;
    let target = ctx.logout().await.unwrap();
    assert_eq!(target, None);
    assert_eq!(source.sign_out_calls(), 0);
}

#[tokio::test]
async fn logout_is_idempotent() {
    let id = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new().with_identity(test_identity(id, "worker@example.com")));
    let ctx = AuthContext::mount(source.clone());
    ctx.initialize().await;

    let target = ctx.logout().await.unwrap();
    assert_eq!(target, Some("/"));
    assert_eq!(ctx.state().phase, AuthPhase::Anonymous);
    assert_eq!(source.sign_out_calls(), 1);

    // Second call: no error, no second sign-out, no second navigation.
    let target = ctx.logout().await.unwrap();
    assert_eq!(target, None);
    assert_eq!(source.sign_out_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn no_state_update_lands_after_unmount() {
    let id = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new());
    source.push_resolution(
        Duration::from_millis(50),
        ScriptedIdentity::Found(test_identity(id, "worker@example.com")),
    );
    let ctx = AuthContext::mount(source.clone());

    source.emit(SessionEvent::SignedIn(test_identity(id, "worker@example.com")));
    // Let the resolution start, then unmount while it is in flight.
    tokio::time::sleep(Duration::from_millis(10)).await;
    ctx.unmount();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = ctx.state();
    assert_ne!(state.phase, AuthPhase::Authenticated);
    assert!(state.user.is_none());
}

#[tokio::test]
async fn page_loading_flag_survives_session_updates() {
    let id = Uuid::new_v4();
    let source = Arc::new(MockSessionSource::new().with_identity(test_identity(id, "worker@example.com")));
    let ctx = AuthContext::mount(source);

    ctx.set_page_loading(true);
    ctx.initialize().await;

    let state = ctx.state();
    assert_eq!(state.phase, AuthPhase::Authenticated);
    assert!(state.is_page_loading);

    ctx.set_page_loading(false);
    assert!(!ctx.state().is_page_loading);
}
