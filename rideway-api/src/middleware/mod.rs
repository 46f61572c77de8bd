mod auth;

pub use auth::{require_captain, require_user, AuthToken};
