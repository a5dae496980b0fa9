pub mod auth;
pub mod email;
pub mod image;
pub mod rate_limiter;

pub use email::EmailService;
pub use rate_limiter::RateLimiter;
