//! API 模块常量定义

/// 会话 Cookie 名称
pub const SESSION_COOKIE_NAME: &str = "linkhub.sid";

/// 表单 / 查询参数中的 CSRF 字段名
pub const CSRF_FIELD: &str = "_csrf";

/// CSRF Header 名称
pub const CSRF_HEADER: &str = "x-csrf-token";

pub const ADMIN_PATH: &str = "/admin";
pub const LOGIN_PATH: &str = "/admin/login";
pub const LOGOUT_PATH: &str = "/admin/logout";
