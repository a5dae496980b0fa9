pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, require_admin_manager, AuthAdmin};
pub use rate_limit::login_rate_limit;
