//! Authorization module for the HR portal gateway.
//!
//! Provides the error taxonomy shared by the interceptor and the page
//! handlers, plus a fluent API for role checks on server-rendered admin
//! paths:
//!
//! ```rust,ignore
//! use server_core::common::auth::{Actor, AdminCapability};
//!
//! Actor::new(user_id, profile.role)
//!     .can(AdminCapability::ManageUsers)
//!     .check()?;
//! ```

mod builder;
mod capability;
mod error_code;
mod errors;

pub use builder::{Actor, CapabilityBuilder};
pub use capability::AdminCapability;
pub use error_code::ErrorCode;
pub use errors::AuthError;
