pub mod admin;
pub mod assets;
pub mod debug;
pub mod public;
pub mod redirect;

pub use redirect::{not_found, resolve_slug};
