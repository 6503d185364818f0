pub mod auth;
pub mod csrf;
pub mod request_id;

pub use auth::{AdminAuth, AdminSession};
pub use csrf::CsrfGuard;
pub use request_id::RequestTrace;
