pub mod auth_callback;
pub mod error_pages;
pub mod health;
pub mod pages;

pub use auth_callback::auth_callback_handler;
pub use error_pages::{app_error_page, public_error_page};
pub use health::health_handler;
pub use pages::{admin_page, dashboard_page, login_page, not_found_page};
