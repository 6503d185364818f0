pub mod auth;
pub mod page;
pub mod redirect;
pub mod sanitizer;
pub mod uploads;

pub use auth::{AdminBootstrap, AuthService};
pub use page::{PageContext, PageViewModel};
pub use redirect::RedirectService;
pub use sanitizer::Policy;
pub use uploads::{PendingUpload, UploadKind, UploadService};
