// HTTP middleware
pub mod cookies;
pub mod edge_interceptor;

pub use edge_interceptor::*;
