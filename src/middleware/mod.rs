mod auth;

pub use auth::{AuthMiddleware, HealthMiddleware};
