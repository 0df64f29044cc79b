// HR Portal - Authorization Gateway
//
// This crate is the transport-boundary half of the portal's authorization
// gateway: an edge interceptor that classifies every incoming request,
// refreshes the session with the hosted identity provider, and either
// passes the request through or redirects it to sign-in or an error page.
//
// The per-browser-tab half (authorization context + guards) lives in the
// web-client crate. Both layers independently reach the same allow/deny
// decision from the same underlying state; that redundancy is deliberate
// defense in depth, not duplication.

pub mod common;
pub mod config;
pub mod kernel;
pub mod server;

pub use config::*;
