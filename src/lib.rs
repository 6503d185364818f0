//! LinkHub - a self-hosted link-in-bio page
//!
//! A public page listing links and embeds, a password-protected dashboard to
//! edit them, and short-slug redirects.
//!
//! # Architecture
//! - `api`: HTTP handlers, middleware and templates
//! - `services`: sanitizer, page assembly, redirects, uploads, authentication
//! - `repository`: data access for every table
//! - `storage`: database connection, migrations and seeding
//! - `config`: configuration loading
//! - `runtime`: application lifecycle and CLI commands
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod repository;
pub mod runtime;
pub mod services;
pub mod state;
pub mod storage;
pub mod system;
pub mod utils;
