//! Guard components gating client-side navigation.

use crate::context::{AuthPhase, AuthState};
use std::time::Duration;
use tokio::time::Instant;

/// Client-side login path, mirrored by the edge interceptor.
pub const LOGIN_PATH: &str = "/login";
/// Landing page for a signed-in user denied by a role guard.
pub const DEFAULT_LANDING: &str = "/dashboard";

/// Hard ceiling on how long the loading overlay may block the page.
pub const LOADING_OVERLAY_TIMEOUT: Duration = Duration::from_secs(8);

/// What a guard decided for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the protected content.
    Render,
    /// Resolution still in flight; show the loading presentation.
    Loading,
    /// Navigate away. Protected content is never rendered meanwhile.
    Redirect(&'static str),
    /// Show the error surface with this message.
    Error(String),
}

impl GuardOutcome {
    pub fn renders_children(&self) -> bool {
        matches!(self, GuardOutcome::Render)
    }

    /// Whether the guard shows the loading presentation instead of
    /// content. A pending redirect also shows it so protected content
    /// never flashes before navigation completes.
    pub fn shows_loading(&self) -> bool {
        matches!(self, GuardOutcome::Loading | GuardOutcome::Redirect(_))
    }
}

/// Declarative route guard.
///
/// [`Guard::auth`] requires any authenticated user; [`Guard::admin`]
/// additionally requires the admin role. Evaluation is pure: feed it
/// the current [`AuthState`] and act on the outcome.
pub struct Guard {
    role_check: fn(&AuthState) -> bool,
    deny_target: &'static str,
}

impl Guard {
    pub fn auth() -> Self {
        Self {
            role_check: |_| true,
            deny_target: DEFAULT_LANDING,
        }
    }

    pub fn admin() -> Self {
        Self {
            role_check: |state| state.is_admin,
            deny_target: DEFAULT_LANDING,
        }
    }

    pub fn evaluate(&self, state: &AuthState) -> GuardOutcome {
        match state.phase {
            AuthPhase::Uninitialized | AuthPhase::Loading => GuardOutcome::Loading,
            AuthPhase::Errored => GuardOutcome::Error(
                state
                    .error
                    .clone()
                    .unwrap_or_else(|| "Something went wrong.".to_string()),
            ),
            AuthPhase::Anonymous => GuardOutcome::Redirect(LOGIN_PATH),
            AuthPhase::Authenticated => {
                if (self.role_check)(state) {
                    GuardOutcome::Render
                } else {
                    GuardOutcome::Redirect(self.deny_target)
                }
            }
        }
    }
}

/// Blocking loading presentation with a safety timeout.
///
/// Re-armed on each navigation or session notification; once the
/// timeout elapses the overlay hides and stays hidden until the next
/// re-arm, even if the state is still loading.
pub struct LoadingOverlay {
    armed_at: Option<Instant>,
    timeout: Duration,
}

impl LoadingOverlay {
    pub fn new() -> Self {
        Self::with_timeout(LOADING_OVERLAY_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            armed_at: None,
            timeout,
        }
    }

    /// Restart the timeout window.
    pub fn rearm(&mut self) {
        self.armed_at = Some(Instant::now());
    }

    pub fn is_visible(&self, outcome: &GuardOutcome) -> bool {
        if !outcome.shows_loading() {
            return false;
        }
        match self.armed_at {
            Some(armed_at) => armed_at.elapsed() < self.timeout,
            None => false,
        }
    }
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self::new()
    }
}
