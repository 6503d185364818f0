//! 管理后台端点
//!
//! - 认证（登录、登出、登录限流）
//! - 后台首页
//! - 链接 / 嵌入块 / 重定向的增删改
//! - 站点设置与图片上传

pub mod auth;
pub mod content;
pub mod dashboard;
pub mod settings;
pub mod types;

pub use auth::{LoginLimiterConfig, login, login_page, login_rate_limit, login_rate_limiter, logout};
pub use content::{
    delete_embed, delete_link, delete_redirect, save_embed, save_link, save_redirect,
};
pub use dashboard::dashboard;
pub use settings::save_settings;
pub use types::*;
