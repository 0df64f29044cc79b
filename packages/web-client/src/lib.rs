// HR Portal - client-side half of the authorization gateway.
//
// One AuthContext is created per browser tab when the authenticated shell
// mounts. It is the single source of truth for "who is the current user
// and what can they do": it resolves identity and profile from the
// session source, follows the provider's session-change notifications,
// and feeds the guard components that gate client-side navigation.
//
// The edge interceptor (server crate) makes the same decisions at the
// network boundary. Keeping both layers is deliberate: the interceptor
// cannot see navigations that happen without a request round trip.

pub mod context;
pub mod guard;
pub mod session;
pub mod testing;

pub use context::{AuthContext, AuthPhase, AuthState};
pub use guard::{Guard, GuardOutcome, LoadingOverlay};
pub use session::SessionSource;
